//! Handle type for registered markers.

/// Registry-assigned identifier for a live marker.
///
/// Handles are assigned sequentially and never reused, so a handle kept
/// after `destroy_marker` can never resolve to a marker created later, even
/// one registered under the same pattern id. Lightweight and `Copy`, it
/// lets tracking results and callbacks refer to markers without holding
/// the registry lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerHandle(pub u64);

impl MarkerHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for MarkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MK{}", self.0)
    }
}
