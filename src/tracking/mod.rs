//! Tracking: tracker kinds, the marker tracker and its tracking thread.
//!
//! - `tracker`: the closed set of tracker kinds and their lifecycle trait
//! - `marker_tracker`: marker create/destroy under the cycle lock
//! - `worker`: per-frame loop (cycle, update callback, render)
//! - `detector`: pluggable vision backend

pub mod detector;
pub mod marker_tracker;
pub mod result;
pub mod state;
pub mod tracker;
pub mod worker;

pub use detector::{DetectionMatcher, MarkerDetector};
pub use marker_tracker::{MarkerAccess, MarkerTracker};
pub use result::{MarkerResult, TimingStats, TrackingResult};
pub use state::TrackerState;
pub use tracker::{AnyTracker, Tracker, TrackerType};
