//! Error types for the tracking core.

use thiserror::Error;

use crate::camera::CameraStatus;
use crate::markers::MarkerHandle;
use crate::tracking::TrackerType;

/// Failure of a tracker, registry, camera or manager operation.
///
/// Nothing in the crate panics on these conditions; every fallible call
/// reports through one of these variants.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("marker id {0} is already registered")]
    DuplicateMarkerId(i32),

    #[error("invalid marker size {0}")]
    InvalidMarkerSize(crate::geometry::MarkerSize),

    #[error("marker capacity of {0} reached")]
    MarkerCapacity(usize),

    #[error("unknown marker {0}")]
    UnknownMarker(MarkerHandle),

    #[error("tracker is already running")]
    AlreadyRunning,

    #[error("tracker is not running")]
    NotRunning,

    #[error("tracker has been deinitialized")]
    Deinitialized,

    #[error("frame queue is full, frame {0} dropped")]
    FrameQueueFull(u64),

    #[error("a render handler is already registered")]
    RenderHandlerRegistered,

    #[error("camera device is {0}")]
    CameraActive(CameraStatus),

    #[error("camera device cannot {op} while {from}")]
    CameraTransition { from: CameraStatus, op: &'static str },

    #[error("{0} tracker is already initialized")]
    AlreadyInitialized(TrackerType),

    #[error("{0} tracker is not initialized")]
    NotInitialized(TrackerType),

    #[error("failed to spawn tracking thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for TrackerError {
    fn from(e: toml::de::Error) -> Self {
        TrackerError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
