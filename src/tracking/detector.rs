//! Vision backend seam.
//!
//! The image-level work (finding marker quads, decoding ids, solving pose)
//! lives behind `MarkerDetector`. The tracker only guarantees that the
//! registry handed to `detect` is not mutated while the call runs.

use std::collections::HashMap;

use crate::camera::CameraFrame;
use crate::markers::MarkerRegistry;

use super::result::MarkerResult;

/// Produces marker poses for one frame against the current registry.
pub trait MarkerDetector: Send {
    fn detect(&mut self, frame: &CameraFrame, registry: &MarkerRegistry) -> Vec<MarkerResult>;
}

/// Default backend: associates upstream detections carried on the frame
/// with registered markers.
///
/// Detections whose pattern id is not registered are ignored. When the same
/// id is detected more than once in a frame, the most confident detection
/// wins. Results come out in registry order.
#[derive(Debug, Clone)]
pub struct DetectionMatcher {
    min_confidence: f32,
}

impl DetectionMatcher {
    pub fn new(min_confidence: f32) -> Self {
        Self { min_confidence }
    }
}

impl Default for DetectionMatcher {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl MarkerDetector for DetectionMatcher {
    fn detect(&mut self, frame: &CameraFrame, registry: &MarkerRegistry) -> Vec<MarkerResult> {
        let mut best: HashMap<i32, usize> = HashMap::new();
        for (i, det) in frame.detections.iter().enumerate() {
            if !det.confidence.is_finite()
                || det.confidence < self.min_confidence
                || !det.pose.is_finite()
            {
                continue;
            }
            best.entry(det.marker_id)
                .and_modify(|j| {
                    if det.confidence > frame.detections[*j].confidence {
                        *j = i;
                    }
                })
                .or_insert(i);
        }

        registry
            .iter()
            .filter_map(|marker| {
                let det = &frame.detections[*best.get(&marker.id)?];
                Some(MarkerResult {
                    handle: marker.handle,
                    marker_id: marker.id,
                    name: marker.name.clone(),
                    size: marker.size,
                    pose: det.pose.clone(),
                    confidence: det.confidence,
                })
            })
            .collect()
    }
}
