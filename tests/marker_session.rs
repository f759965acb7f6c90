//! End-to-end marker tracking sessions: manager, tracker thread, callbacks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use rust_artrack::TrackerError;
use rust_artrack::camera::{CameraDevice, CameraFrame, MarkerDetection};
use rust_artrack::config::TrackerConfig;
use rust_artrack::geometry::{MarkerSize, SE3};
use rust_artrack::markers::{MarkerHandle, MarkerRegistry};
use rust_artrack::system::TrackerManager;
use rust_artrack::tracking::{
    MarkerAccess, MarkerDetector, MarkerResult, MarkerTracker, Tracker, TrackerState, TrackerType,
    TrackingResult,
};

const TIMEOUT: Duration = Duration::from_secs(5);

fn test_config() -> TrackerConfig {
    TrackerConfig {
        frame_poll_interval_ms: 5,
        frame_queue_capacity: 1,
        ..TrackerConfig::default()
    }
}

fn init_marker_tracker(manager: &TrackerManager) -> Arc<MarkerTracker> {
    manager
        .init_tracker(TrackerType::Marker)
        .unwrap()
        .into_marker()
        .unwrap()
}

/// Signals when a cycle starts and keeps it open until released.
struct GatedDetector {
    entered: crossbeam_channel::Sender<()>,
    release: crossbeam_channel::Receiver<()>,
}

impl MarkerDetector for GatedDetector {
    fn detect(&mut self, _frame: &CameraFrame, _registry: &MarkerRegistry) -> Vec<MarkerResult> {
        let _ = self.entered.send(());
        let _ = self.release.recv_timeout(TIMEOUT);
        Vec::new()
    }
}

/// Re-reads the registry after a pause and counts any change seen
/// within a single cycle.
struct SnapshotDetector {
    cycles: Arc<AtomicUsize>,
    torn: Arc<AtomicUsize>,
}

impl MarkerDetector for SnapshotDetector {
    fn detect(&mut self, _frame: &CameraFrame, registry: &MarkerRegistry) -> Vec<MarkerResult> {
        let before: Vec<MarkerHandle> = registry.iter().map(|m| m.handle).collect();
        let revision = registry.revision();
        thread::sleep(Duration::from_millis(1));
        let after: Vec<MarkerHandle> = registry.iter().map(|m| m.handle).collect();

        if before != after || revision != registry.revision() || after.len() != registry.count() {
            self.torn.fetch_add(1, Ordering::SeqCst);
        }
        self.cycles.fetch_add(1, Ordering::SeqCst);
        Vec::new()
    }
}

#[test]
fn test_create_then_concurrent_destroy_scenario() {
    let manager = TrackerManager::new(Arc::new(CameraDevice::new()), test_config());
    let tracker = init_marker_tracker(&manager);

    let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
    let (release_tx, release_rx) = crossbeam_channel::unbounded();
    tracker
        .set_detector(Box::new(GatedDetector {
            entered: entered_tx,
            release: release_rx,
        }))
        .unwrap();

    assert_eq!(tracker.state(), TrackerState::Stopped);
    let handle = tracker
        .create_frame_marker(1, "A", MarkerSize::new(10.0, 10.0))
        .unwrap();
    assert_eq!(tracker.num_markers(), 1);

    tracker.start().unwrap();
    tracker.submit_frame(CameraFrame::new(0, 0)).unwrap();
    entered_rx.recv_timeout(TIMEOUT).unwrap();

    let finished = Arc::new(AtomicBool::new(false));
    let destroyer = {
        let tracker = tracker.clone();
        let finished = finished.clone();
        thread::spawn(move || {
            let result = tracker.destroy_marker(handle);
            finished.store(true, Ordering::SeqCst);
            result
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!finished.load(Ordering::SeqCst));

    release_tx.send(()).unwrap();
    assert!(destroyer.join().unwrap().is_ok());
    assert_eq!(tracker.num_markers(), 0);
    assert!(tracker.marker(0).is_none());
    assert!(matches!(
        tracker.destroy_marker(handle),
        Err(TrackerError::UnknownMarker(_))
    ));

    tracker.stop().unwrap();
    manager.deinit_tracker(TrackerType::Marker).unwrap();
}

#[test]
fn test_cycles_never_observe_partial_mutation() {
    let cycles = Arc::new(AtomicUsize::new(0));
    let torn = Arc::new(AtomicUsize::new(0));
    let tracker = Arc::new(MarkerTracker::with_detector(
        test_config(),
        Box::new(SnapshotDetector {
            cycles: cycles.clone(),
            torn: torn.clone(),
        }),
    ));
    tracker.start().unwrap();

    let running = Arc::new(AtomicBool::new(true));
    let feeder = {
        let tracker = tracker.clone();
        let running = running.clone();
        thread::spawn(move || {
            let mut index = 0;
            while running.load(Ordering::SeqCst) {
                match tracker.submit_frame(CameraFrame::new(index, 0)) {
                    Ok(()) | Err(TrackerError::FrameQueueFull(_)) => {}
                    Err(e) => panic!("unexpected submit error: {}", e),
                }
                index += 1;
                thread::sleep(Duration::from_micros(500));
            }
        })
    };

    for round in 0..200 {
        let id = round % 7;
        let handle = tracker
            .create_frame_marker(id, "churn", MarkerSize::new(1.0, 1.0))
            .unwrap();
        if round % 3 != 0 {
            tracker.destroy_marker(handle).unwrap();
        } else if let Some(m) = tracker.find_marker_by_id((id + 1) % 7) {
            tracker.destroy_marker(m.handle).unwrap();
        }
        if let Some(m) = tracker.find_marker_by_id(id) {
            tracker.destroy_marker(m.handle).unwrap();
        }
    }

    running.store(false, Ordering::SeqCst);
    feeder.join().unwrap();
    tracker.stop().unwrap();

    assert!(cycles.load(Ordering::SeqCst) > 0);
    assert_eq!(torn.load(Ordering::SeqCst), 0);
    assert_eq!(tracker.num_markers(), 0);
}

#[test]
fn test_session_with_camera_and_callbacks() {
    let camera = Arc::new(CameraDevice::new());
    let manager = TrackerManager::new(camera.clone(), TrackerConfig {
        frame_queue_capacity: 8,
        ..test_config()
    });
    let tracker = init_marker_tracker(&manager);
    let a = tracker
        .create_frame_marker(1, "A", MarkerSize::new(10.0, 10.0))
        .unwrap();

    let (render_tx, render_rx) = crossbeam_channel::unbounded();
    tracker
        .register_render_handler(move |result: &TrackingResult| {
            let _ = render_tx.send(result.clone());
        })
        .unwrap();
    assert!(matches!(
        tracker.register_render_handler(|_result: &TrackingResult| {}),
        Err(TrackerError::RenderHandlerRegistered)
    ));

    tracker.set_update_callback(|markers: &MarkerAccess, result: &TrackingResult| {
        if result.frame_index == 1 {
            markers
                .create_frame_marker(2, "B", MarkerSize::new(5.0, 5.0))
                .unwrap();
        }
    });

    tracker.start().unwrap();
    camera.init().unwrap();
    camera.start().unwrap();

    // Trackers cannot be torn down while the camera is up.
    assert!(matches!(
        manager.deinit_tracker(TrackerType::Marker),
        Err(TrackerError::CameraActive(_))
    ));
    assert!(matches!(
        manager.init_tracker(TrackerType::Marker),
        Err(TrackerError::CameraActive(_))
    ));

    let pose = SE3::from_translation(nalgebra::Vector3::new(0.0, 0.0, 100.0));
    for i in 0..3 {
        let frame = CameraFrame::new(i, i * 1000).with_detections(vec![
            MarkerDetection::new(1, pose.clone()),
            MarkerDetection::new(2, pose.clone()),
        ]);
        tracker.submit_frame(frame).unwrap();
        let result = render_rx.recv_timeout(TIMEOUT).unwrap();
        assert_eq!(result.frame_index, i);

        // Marker B only exists from the frame after the callback created it.
        let expected = if i < 2 { 1 } else { 2 };
        assert_eq!(result.num_tracked(), expected, "frame {}", i);
        assert_eq!(result.find(a).unwrap().name, "A");
    }

    tracker.stop().unwrap();
    camera.stop().unwrap();
    camera.deinit().unwrap();

    assert_eq!(tracker.latest_result().unwrap().frame_index, 2);
    manager.deinit_tracker(TrackerType::Marker).unwrap();
    assert!(tracker.is_deinitialized());
    assert!(tracker.latest_result().is_none());
    assert!(!tracker.has_render_handler());
}
