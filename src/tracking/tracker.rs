//! Tracker kinds and their common lifecycle contract.

use std::sync::Arc;

use crate::error::Result;

use super::marker_tracker::MarkerTracker;
use super::state::TrackerState;

/// Closed set of tracker kinds the manager can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackerType {
    /// Rectangular frame markers identified by pattern id.
    Marker,
}

impl TrackerType {
    pub const ALL: [TrackerType; 1] = [TrackerType::Marker];
}

impl std::fmt::Display for TrackerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackerType::Marker => f.write_str("marker"),
        }
    }
}

/// Lifecycle every tracker kind implements.
pub trait Tracker: Send + Sync {
    fn tracker_type(&self) -> TrackerType;

    /// Spawn the tracking thread.
    fn start(&self) -> Result<()>;

    /// Stop tracking between cycles and join the tracking thread.
    fn stop(&self) -> Result<()>;

    fn state(&self) -> TrackerState;

    /// Stop and release every resource. Later operations fail with
    /// `TrackerError::Deinitialized`.
    fn deinit(&self);
}

/// Shared handle to a live tracker of any kind.
#[derive(Clone)]
pub enum AnyTracker {
    Marker(Arc<MarkerTracker>),
}

impl AnyTracker {
    pub(crate) fn create(tracker_type: TrackerType, config: &crate::config::TrackerConfig) -> Self {
        match tracker_type {
            TrackerType::Marker => AnyTracker::Marker(Arc::new(MarkerTracker::new(config.clone()))),
        }
    }

    pub fn tracker_type(&self) -> TrackerType {
        self.as_tracker().tracker_type()
    }

    pub fn as_tracker(&self) -> &dyn Tracker {
        match self {
            AnyTracker::Marker(t) => t.as_ref(),
        }
    }

    pub fn as_marker(&self) -> Option<&Arc<MarkerTracker>> {
        match self {
            AnyTracker::Marker(t) => Some(t),
        }
    }

    pub fn into_marker(self) -> Option<Arc<MarkerTracker>> {
        match self {
            AnyTracker::Marker(t) => Some(t),
        }
    }

    /// True when both handles refer to the same tracker instance.
    pub fn ptr_eq(&self, other: &AnyTracker) -> bool {
        match (self, other) {
            (AnyTracker::Marker(a), AnyTracker::Marker(b)) => Arc::ptr_eq(a, b),
        }
    }
}

impl std::fmt::Debug for AnyTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnyTracker")
            .field("type", &self.tracker_type())
            .field("state", &self.as_tracker().state())
            .finish()
    }
}
