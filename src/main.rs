use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use nalgebra::{UnitQuaternion, Vector3};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rust_artrack::camera::{CameraDevice, CameraFrame, MarkerDetection};
use rust_artrack::config::ArConfig;
use rust_artrack::geometry::{MarkerSize, SE3};
use rust_artrack::system::TrackerManager;
use rust_artrack::tracking::{MarkerAccess, Tracker, TrackerType, TrackingResult};
use rust_artrack::TrackerError;

/// Frames in the synthetic session.
const NUM_FRAMES: u64 = 120;

/// Frame at which the update callback swaps marker 2 for marker 3.
const SWAP_FRAME: u64 = 60;

fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => ArConfig::load(Path::new(&path))
            .with_context(|| format!("loading config from {}", path))?,
        None => ArConfig::default(),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let camera = Arc::new(CameraDevice::new());
    let manager = TrackerManager::new(camera.clone(), config.tracker.clone());

    // Trackers must exist before the camera comes up.
    let tracker = manager
        .init_tracker(TrackerType::Marker)?
        .into_marker()
        .context("marker tracker handle")?;

    tracker.create_frame_marker(1, "chips", MarkerSize::new(10.0, 10.0))?;
    tracker.create_frame_marker(2, "tarmac", MarkerSize::new(20.0, 20.0))?;
    println!("Created {} markers", tracker.num_markers());

    tracker.register_render_handler(|result: &TrackingResult| {
        for m in &result.markers {
            let t = m.pose.translation;
            info!(
                "frame {}: '{}' at [{:.2}, {:.2}, {:.2}]",
                result.frame_index, m.name, t.x, t.y, t.z
            );
        }
    })?;

    tracker.set_update_callback(|markers: &MarkerAccess, result: &TrackingResult| {
        if result.frame_index != SWAP_FRAME {
            return;
        }
        if let Some(old) = markers.find_marker_by_id(2) {
            match markers.destroy_marker(old.handle) {
                Ok(m) => info!("Destroyed {} in update callback", m),
                Err(e) => warn!("destroy failed: {}", e),
            }
        }
        if let Err(e) = markers.create_frame_marker(3, "stones", MarkerSize::new(15.0, 15.0)) {
            warn!("create failed: {}", e);
        }
    });

    tracker.start()?;
    camera.init()?;
    camera.start()?;

    let mut dropped = 0;
    for i in 0..NUM_FRAMES {
        match tracker.submit_frame(synthetic_frame(i)) {
            Ok(()) => {}
            Err(TrackerError::FrameQueueFull(_)) => dropped += 1,
            Err(e) => return Err(e.into()),
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    // Let the queue drain.
    std::thread::sleep(Duration::from_millis(100));

    tracker.stop()?;
    camera.stop()?;
    camera.deinit()?;

    println!(
        "Tracked {} frames ({} dropped), {} markers registered at exit",
        tracker.cycles_completed(),
        dropped,
        tracker.num_markers()
    );
    if let Some(last) = tracker.latest_result() {
        println!(
            "Last frame {}: {} markers tracked, cycle {:.3} ms",
            last.frame_index,
            last.num_tracked(),
            last.timing.total_ms
        );
    }

    manager.deinit_tracker(TrackerType::Marker)?;
    Ok(())
}

/// Frame with every known marker id orbiting in front of the camera.
fn synthetic_frame(index: u64) -> CameraFrame {
    let angle = index as f64 * 0.05;
    let detections = [1, 2, 3]
        .iter()
        .map(|&id| {
            let phase = angle + id as f64;
            let pose = SE3::new(
                UnitQuaternion::from_axis_angle(&Vector3::z_axis(), phase),
                Vector3::new(phase.cos() * 20.0, phase.sin() * 20.0, 150.0),
            );
            MarkerDetection::new(id, pose)
        })
        .collect();

    CameraFrame::new(index, index * 33_333_333).with_detections(detections)
}
