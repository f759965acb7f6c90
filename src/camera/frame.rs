//! Per-frame tracker input.

use crate::geometry::SE3;

/// Marker observation produced upstream of the tracker (e.g. by a fiducial
/// detector running on the camera image).
#[derive(Debug, Clone)]
pub struct MarkerDetection {
    /// Pattern id decoded from the image.
    pub marker_id: i32,
    /// Estimated marker pose in the camera frame (T_cm).
    pub pose: SE3,
    /// Detector confidence in [0, 1].
    pub confidence: f32,
}

impl MarkerDetection {
    pub fn new(marker_id: i32, pose: SE3) -> Self {
        Self {
            marker_id,
            pose,
            confidence: 1.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }
}

/// One camera frame as seen by the tracking loop.
#[derive(Debug, Clone, Default)]
pub struct CameraFrame {
    /// Monotonic frame counter assigned by the producer.
    pub index: u64,
    /// Capture timestamp in nanoseconds.
    pub timestamp_ns: u64,
    pub detections: Vec<MarkerDetection>,
}

impl CameraFrame {
    pub fn new(index: u64, timestamp_ns: u64) -> Self {
        Self {
            index,
            timestamp_ns,
            detections: Vec::new(),
        }
    }

    pub fn with_detections(mut self, detections: Vec<MarkerDetection>) -> Self {
        self.detections = detections;
        self
    }
}
