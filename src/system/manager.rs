//! Tracker Manager - owner of the live trackers.
//!
//! The `TrackerManager` is the context object applications hold for the
//! lifetime of their AR session. It keeps at most one tracker per
//! `TrackerType` and refuses tracker init/deinit while the camera device is
//! initialized or running. The camera's status lock is held across the
//! check and the map update, so the camera cannot come up halfway through.
//! Stopping a tracker happens after the lock is released, since its
//! callbacks may read the camera status.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::camera::CameraDevice;
use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::tracking::{AnyTracker, MarkerTracker, TrackerType};

/// Owner of every initialized tracker.
pub struct TrackerManager {
    /// Camera whose lifecycle gates tracker init/deinit.
    camera: Arc<CameraDevice>,

    /// Settings applied to newly created trackers.
    config: TrackerConfig,

    trackers: Mutex<HashMap<TrackerType, AnyTracker>>,
}

impl TrackerManager {
    pub fn new(camera: Arc<CameraDevice>, config: TrackerConfig) -> Self {
        Self {
            camera,
            config,
            trackers: Mutex::new(HashMap::new()),
        }
    }

    pub fn camera(&self) -> &Arc<CameraDevice> {
        &self.camera
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Initialize the tracker of the given type.
    ///
    /// Fails if that tracker is already initialized or the camera device is
    /// initialized or running. The manager keeps ownership; the returned
    /// handle is shared.
    pub fn init_tracker(&self, tracker_type: TrackerType) -> Result<AnyTracker> {
        let camera = self.camera.lock_status();
        if camera.is_initialized() {
            warn!("Refusing to init {} tracker: camera is {}", tracker_type, *camera);
            return Err(TrackerError::CameraActive(*camera));
        }

        let mut trackers = self.trackers.lock();
        if trackers.contains_key(&tracker_type) {
            return Err(TrackerError::AlreadyInitialized(tracker_type));
        }

        let tracker = AnyTracker::create(tracker_type, &self.config);
        trackers.insert(tracker_type, tracker.clone());
        info!("Initialized {} tracker", tracker_type);
        Ok(tracker)
    }

    /// The tracker of the given type, if initialized. Ownership stays with
    /// the manager.
    pub fn get_tracker(&self, tracker_type: TrackerType) -> Option<AnyTracker> {
        self.trackers.lock().get(&tracker_type).cloned()
    }

    pub fn marker_tracker(&self) -> Option<Arc<MarkerTracker>> {
        self.get_tracker(TrackerType::Marker)?.into_marker()
    }

    /// Deinitialize the tracker of the given type and release its resources.
    ///
    /// Fails if it is not initialized or the camera device is initialized or
    /// running; in both cases the tracker is left untouched. Handles the
    /// application still holds report `Deinitialized` afterwards.
    pub fn deinit_tracker(&self, tracker_type: TrackerType) -> Result<()> {
        let tracker = {
            let camera = self.camera.lock_status();
            if camera.is_initialized() {
                warn!("Refusing to deinit {} tracker: camera is {}", tracker_type, *camera);
                return Err(TrackerError::CameraActive(*camera));
            }
            self.trackers
                .lock()
                .remove(&tracker_type)
                .ok_or(TrackerError::NotInitialized(tracker_type))?
        };

        // Joins the tracking thread; the camera lock must be free by now.
        tracker.as_tracker().deinit();
        info!("Deinitialized {} tracker", tracker_type);
        Ok(())
    }

    pub fn is_initialized(&self, tracker_type: TrackerType) -> bool {
        self.trackers.lock().contains_key(&tracker_type)
    }

    /// Number of initialized trackers.
    pub fn num_trackers(&self) -> usize {
        self.trackers.lock().len()
    }

    /// Teardown hook: stop and release every tracker regardless of camera
    /// state. Also run on drop.
    pub fn shutdown(&self) {
        for tracker_type in TrackerType::ALL {
            let Some(tracker) = self.trackers.lock().remove(&tracker_type) else {
                continue;
            };
            tracker.as_tracker().deinit();
            info!("Released {} tracker on shutdown", tracker_type);
        }
    }
}

impl Drop for TrackerManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    use crate::camera::{CameraFrame, CameraStatus};
    use crate::geometry::MarkerSize;
    use crate::tracking::{Tracker, TrackerState, TrackingResult};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn create_manager() -> TrackerManager {
        TrackerManager::new(Arc::new(CameraDevice::new()), TrackerConfig::default())
    }

    #[test]
    fn test_init_twice_fails() {
        let manager = create_manager();

        let first = manager.init_tracker(TrackerType::Marker).unwrap();
        let second = manager.init_tracker(TrackerType::Marker);

        assert!(matches!(second, Err(TrackerError::AlreadyInitialized(TrackerType::Marker))));
        let current = manager.get_tracker(TrackerType::Marker).unwrap();
        assert!(current.ptr_eq(&first));
    }

    #[test]
    fn test_get_before_init() {
        let manager = create_manager();
        assert!(manager.get_tracker(TrackerType::Marker).is_none());
        assert!(manager.marker_tracker().is_none());
    }

    #[test]
    fn test_init_refused_while_camera_initialized() {
        let manager = create_manager();
        manager.camera().init().unwrap();

        assert!(matches!(
            manager.init_tracker(TrackerType::Marker),
            Err(TrackerError::CameraActive(CameraStatus::Initialized))
        ));
        assert_eq!(manager.num_trackers(), 0);

        manager.camera().start().unwrap();
        assert!(matches!(
            manager.init_tracker(TrackerType::Marker),
            Err(TrackerError::CameraActive(CameraStatus::Running))
        ));
    }

    #[test]
    fn test_deinit_refused_while_camera_initialized() {
        let manager = create_manager();
        let tracker = manager.init_tracker(TrackerType::Marker).unwrap();
        let marker_tracker = tracker.as_marker().unwrap();
        marker_tracker
            .create_frame_marker(1, "A", MarkerSize::new(10.0, 10.0))
            .unwrap();

        manager.camera().init().unwrap();
        assert!(matches!(
            manager.deinit_tracker(TrackerType::Marker),
            Err(TrackerError::CameraActive(CameraStatus::Initialized))
        ));

        // Tracker unchanged.
        let current = manager.get_tracker(TrackerType::Marker).unwrap();
        assert!(current.ptr_eq(&tracker));
        assert!(!marker_tracker.is_deinitialized());
        assert_eq!(marker_tracker.num_markers(), 1);

        manager.camera().deinit().unwrap();
        manager.deinit_tracker(TrackerType::Marker).unwrap();
        assert!(manager.get_tracker(TrackerType::Marker).is_none());
    }

    #[test]
    fn test_deinit_not_initialized() {
        let manager = create_manager();
        assert!(matches!(
            manager.deinit_tracker(TrackerType::Marker),
            Err(TrackerError::NotInitialized(TrackerType::Marker))
        ));
    }

    #[test]
    fn test_stale_handle_after_deinit() {
        let manager = create_manager();
        let tracker = manager.marker_tracker_after_init();
        let handle = tracker
            .create_frame_marker(1, "A", MarkerSize::new(1.0, 1.0))
            .unwrap();

        manager.deinit_tracker(TrackerType::Marker).unwrap();

        assert!(tracker.is_deinitialized());
        assert_eq!(tracker.num_markers(), 0);
        assert!(matches!(
            tracker.create_frame_marker(2, "B", MarkerSize::new(1.0, 1.0)),
            Err(TrackerError::Deinitialized)
        ));
        assert!(matches!(tracker.destroy_marker(handle), Err(TrackerError::Deinitialized)));
        assert!(matches!(tracker.start(), Err(TrackerError::Deinitialized)));
    }

    #[test]
    fn test_repeated_init_deinit_cycles() {
        let manager = create_manager();

        for round in 0..5 {
            let tracker = manager.marker_tracker_after_init();
            assert_eq!(tracker.num_markers(), 0, "round {}", round);
            tracker
                .create_frame_marker(round, "m", MarkerSize::new(1.0, 1.0))
                .unwrap();
            tracker.start().unwrap();
            assert!(tracker.state().is_running());

            manager.deinit_tracker(TrackerType::Marker).unwrap();
            assert_eq!(tracker.state(), TrackerState::Stopped);
            assert!(!manager.is_initialized(TrackerType::Marker));
        }
    }

    #[test]
    fn test_shutdown_ignores_camera_state() {
        let manager = create_manager();
        let tracker = manager.marker_tracker_after_init();
        tracker.start().unwrap();
        manager.camera().init().unwrap();

        manager.shutdown();

        assert_eq!(manager.num_trackers(), 0);
        assert!(tracker.is_deinitialized());
        assert_eq!(tracker.state(), TrackerState::Stopped);
    }

    #[test]
    fn test_deinit_while_render_handler_reads_camera() {
        let manager = Arc::new(create_manager());
        let tracker = manager.marker_tracker_after_init();
        let camera = manager.camera().clone();
        let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
        let (release_tx, release_rx) = crossbeam_channel::unbounded::<()>();
        let (status_tx, status_rx) = crossbeam_channel::unbounded();

        tracker
            .register_render_handler(move |_result: &TrackingResult| {
                let _ = entered_tx.send(());
                let _ = release_rx.recv_timeout(TIMEOUT);
                let _ = status_tx.send(camera.is_initialized());
            })
            .unwrap();

        tracker.start().unwrap();
        tracker.submit_frame(CameraFrame::new(0, 0)).unwrap();
        entered_rx.recv_timeout(TIMEOUT).unwrap();

        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let deinit = {
            let manager = manager.clone();
            thread::spawn(move || {
                let released = manager.deinit_tracker(TrackerType::Marker);
                let _ = done_tx.send(());
                released
            })
        };
        thread::sleep(Duration::from_millis(30));
        release_tx.send(()).unwrap();

        assert!(!status_rx.recv_timeout(TIMEOUT).unwrap());
        assert!(done_rx.recv_timeout(TIMEOUT).is_ok(), "deinit_tracker did not return");
        deinit.join().unwrap().unwrap();
        assert!(tracker.is_deinitialized());
        assert_eq!(tracker.state(), TrackerState::Stopped);
        assert!(!manager.is_initialized(TrackerType::Marker));
    }

    #[test]
    fn test_shutdown_releases_every_type() {
        let manager = create_manager();
        for tracker_type in TrackerType::ALL {
            manager.init_tracker(tracker_type).unwrap();
        }
        assert_eq!(manager.num_trackers(), TrackerType::ALL.len());

        manager.shutdown();
        for tracker_type in TrackerType::ALL {
            assert!(!manager.is_initialized(tracker_type));
        }
    }

    impl TrackerManager {
        fn marker_tracker_after_init(&self) -> Arc<MarkerTracker> {
            self.init_tracker(TrackerType::Marker)
                .unwrap()
                .into_marker()
                .unwrap()
        }
    }
}
