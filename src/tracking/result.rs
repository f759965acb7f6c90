//! Tracking results.
//!
//! These types describe what happened during a single tracking cycle:
//! - which registered markers were found and where (pose in camera frame)
//! - the registry revision the cycle ran against
//! - timing information for profiling

use crate::geometry::{MarkerSize, SE3};
use crate::markers::MarkerHandle;

/// Pose of one registered marker found in a frame.
#[derive(Debug, Clone)]
pub struct MarkerResult {
    pub handle: MarkerHandle,
    pub marker_id: i32,
    pub name: String,
    pub size: MarkerSize,
    /// Marker pose in the camera frame (T_cm).
    pub pose: SE3,
    pub confidence: f32,
}

/// Summary of a tracking cycle.
#[derive(Debug, Clone)]
pub struct TrackingResult {
    pub frame_index: u64,
    pub timestamp_ns: u64,
    pub markers: Vec<MarkerResult>,
    /// Registry revision observed for the whole cycle.
    pub registry_revision: u64,
    /// Number of markers registered while the cycle ran.
    pub num_registered: usize,
    pub timing: TimingStats,
}

/// Timing breakdown for a cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimingStats {
    /// Time spent waiting for the registry lock (mutations in flight).
    pub lock_wait_ms: f64,
    /// Time spent inside the detector.
    pub detect_ms: f64,
    pub total_ms: f64,
}

impl TrackingResult {
    pub fn num_tracked(&self) -> usize {
        self.markers.len()
    }

    pub fn find(&self, handle: MarkerHandle) -> Option<&MarkerResult> {
        self.markers.iter().find(|m| m.handle == handle)
    }

    pub fn find_by_id(&self, marker_id: i32) -> Option<&MarkerResult> {
        self.markers.iter().find(|m| m.marker_id == marker_id)
    }
}
