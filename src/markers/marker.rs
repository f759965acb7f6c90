//! Marker definition.

use crate::geometry::MarkerSize;

use super::types::MarkerHandle;

/// A rectangular frame marker known to a tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Registry handle, valid until the marker is destroyed.
    pub handle: MarkerHandle,
    /// Pattern id encoded in the physical marker.
    pub id: i32,
    pub name: String,
    /// Physical extent in scene units.
    pub size: MarkerSize,
}

impl Marker {
    pub fn new(handle: MarkerHandle, id: i32, name: impl Into<String>, size: MarkerSize) -> Self {
        Self {
            handle,
            id,
            name: name.into(),
            size,
        }
    }
}

impl std::fmt::Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}' (id {}, {})", self.handle, self.name, self.id, self.size)
    }
}
