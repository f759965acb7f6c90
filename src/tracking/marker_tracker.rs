//! MarkerTracker: tracks rectangular frame markers and lets the application
//! create and destroy them while tracking runs.
//!
//! Marker mutation and tracking cycles share one lock:
//! - From any thread, `create_frame_marker` / `destroy_marker` block while a
//!   cycle is active and proceed as soon as it ends.
//! - Inside the update callback no cycle can be active, so the
//!   `MarkerAccess` it receives never waits.
//! - Alternatively, `stop()` the tracker, mutate, and `start()` it again.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Sender, TrySendError, bounded};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::camera::CameraFrame;
use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::geometry::MarkerSize;
use crate::markers::{Marker, MarkerHandle, MarkerRegistry};
use crate::system::callbacks::{RenderHandler, UpdateCallback};
use crate::system::shared_state::SharedState;

use super::detector::{DetectionMatcher, MarkerDetector};
use super::result::TrackingResult;
use super::state::TrackerState;
use super::tracker::{Tracker, TrackerType};
use super::worker::TrackingWorker;

/// Marker tracker handle. Cheap to share behind an `Arc`; all methods take
/// `&self`.
pub struct MarkerTracker {
    /// State shared with the tracking thread.
    shared: Arc<SharedState>,

    config: TrackerConfig,

    /// Serializes start and stop. Never taken on the tracking thread.
    lifecycle: Mutex<()>,

    /// Handle to the tracking thread while running.
    /// Only held briefly; never across a join.
    worker: Mutex<Option<JoinHandle<()>>>,

    /// Frame channel into the tracking thread while running.
    frames: Mutex<Option<Sender<CameraFrame>>>,
}

impl MarkerTracker {
    /// Create a stopped tracker using the default `DetectionMatcher`.
    pub fn new(config: TrackerConfig) -> Self {
        let detector = DetectionMatcher::new(config.min_detection_confidence);
        Self::with_detector(config, Box::new(detector))
    }

    pub fn with_detector(config: TrackerConfig, detector: Box<dyn MarkerDetector>) -> Self {
        let registry = MarkerRegistry::new(config.max_markers);
        Self {
            shared: SharedState::new(registry, detector),
            config,
            lifecycle: Mutex::new(()),
            worker: Mutex::new(None),
            frames: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Markers
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a marker with the given pattern id, name and physical size.
    ///
    /// Blocks while a tracking cycle is active. Fails on a duplicate id, an
    /// invalid size, or when `max_markers` is reached.
    pub fn create_frame_marker(
        &self,
        id: i32,
        name: &str,
        size: impl Into<MarkerSize>,
    ) -> Result<MarkerHandle> {
        self.shared.create_frame_marker(id, name, size.into())
    }

    /// Destroy a marker, returning its definition. Blocks while a tracking
    /// cycle is active.
    pub fn destroy_marker(&self, handle: MarkerHandle) -> Result<Marker> {
        self.shared.destroy_marker(handle)
    }

    pub fn set_marker_size(&self, handle: MarkerHandle, size: impl Into<MarkerSize>) -> Result<()> {
        self.shared.set_marker_size(handle, size.into())
    }

    /// Number of live markers.
    pub fn num_markers(&self) -> usize {
        self.shared.num_markers()
    }

    /// Marker at ordinal position `index`, `None` if out of range.
    pub fn marker(&self, index: usize) -> Option<Marker> {
        self.shared.marker(index)
    }

    pub fn find_marker(&self, handle: MarkerHandle) -> Option<Marker> {
        self.shared.find_marker(handle)
    }

    pub fn find_marker_by_id(&self, id: i32) -> Option<Marker> {
        self.shared.find_marker_by_id(id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Frames and callbacks
    // ─────────────────────────────────────────────────────────────────────────

    /// Queue a frame for tracking. Never blocks: when the queue is full the
    /// frame is dropped and `FrameQueueFull` returned.
    pub fn submit_frame(&self, frame: CameraFrame) -> Result<()> {
        if self.shared.is_deinitialized() {
            return Err(TrackerError::Deinitialized);
        }
        let frames = self.frames.lock();
        let sender = match frames.as_ref() {
            Some(sender) if !self.shared.is_stop_requested() => sender,
            _ => return Err(TrackerError::NotRunning),
        };
        match sender.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(frame)) => {
                debug!("Frame queue full, dropping frame {}", frame.index);
                Err(TrackerError::FrameQueueFull(frame.index))
            }
            Err(TrySendError::Disconnected(_)) => Err(TrackerError::NotRunning),
        }
    }

    /// Install the per-frame update callback, replacing any previous one.
    pub fn set_update_callback<F>(&self, callback: F)
    where
        F: FnMut(&MarkerAccess, &TrackingResult) + Send + 'static,
    {
        self.shared.update.set(callback);
    }

    /// Install an `UpdateCallback` implementor, replacing any previous one.
    pub fn set_update_handler<C: UpdateCallback + 'static>(&self, handler: C) {
        self.shared.update.set(handler);
    }

    pub fn clear_update_callback(&self) -> bool {
        self.shared.update.clear()
    }

    /// Register the render handler. The first registration wins; later
    /// ones fail with `RenderHandlerRegistered`.
    pub fn register_render_handler<H: RenderHandler + 'static>(&self, handler: H) -> Result<()> {
        if self.shared.is_deinitialized() {
            return Err(TrackerError::Deinitialized);
        }
        self.shared.render.register(handler)
    }

    pub fn has_render_handler(&self) -> bool {
        self.shared.render.has_handler()
    }

    /// Result of the most recent cycle, for applications rendering on
    /// their own schedule.
    pub fn latest_result(&self) -> Option<Arc<TrackingResult>> {
        self.shared.latest_result()
    }

    pub fn cycles_completed(&self) -> u64 {
        self.shared.cycles_completed()
    }

    /// Swap the vision backend. Only allowed while stopped.
    pub fn set_detector(&self, detector: Box<dyn MarkerDetector>) -> Result<()> {
        if self.shared.is_tracking_thread() {
            return Err(TrackerError::AlreadyRunning);
        }
        let _lifecycle = self.lifecycle.lock();
        let running = self.worker.lock().as_ref().is_some_and(|h| !h.is_finished());
        if running {
            return Err(TrackerError::AlreadyRunning);
        }
        self.shared.replace_detector(detector)
    }

    pub fn is_deinitialized(&self) -> bool {
        self.shared.is_deinitialized()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    fn start_tracking(&self) -> Result<()> {
        if self.shared.is_tracking_thread() {
            return Err(TrackerError::AlreadyRunning);
        }
        let _lifecycle = self.lifecycle.lock();
        if self.shared.is_deinitialized() {
            return Err(TrackerError::Deinitialized);
        }

        let previous = {
            let mut worker = self.worker.lock();
            match worker.take() {
                Some(handle) if !handle.is_finished() && !self.shared.is_stop_requested() => {
                    *worker = Some(handle);
                    return Err(TrackerError::AlreadyRunning);
                }
                previous => previous,
            }
        };
        // Stopped from inside a callback; reap the exiting thread.
        if let Some(handle) = previous {
            if handle.join().is_err() {
                warn!("Previous tracking thread panicked");
            }
        }

        let (sender, receiver) = bounded::<CameraFrame>(self.config.frame_queue_capacity.max(1));
        self.shared.clear_stop_request();
        self.shared.set_state(TrackerState::Idle);

        let tracking = TrackingWorker::new(self.shared.clone(), self.config.frame_poll_interval());
        let spawned = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || tracking.run(receiver));

        match spawned {
            Ok(handle) => {
                *self.worker.lock() = Some(handle);
                *self.frames.lock() = Some(sender);
                info!("Marker tracker started");
                Ok(())
            }
            Err(e) => {
                self.shared.set_state(TrackerState::Stopped);
                Err(TrackerError::Spawn(e))
            }
        }
    }

    fn stop_tracking(&self) -> Result<()> {
        if self.shared.is_tracking_thread() {
            // The loop exits once the current callback returns.
            self.shared.request_stop();
            debug!("Stop requested from the tracking thread");
            return Ok(());
        }

        let _lifecycle = self.lifecycle.lock();
        let handle = self.worker.lock().take().ok_or(TrackerError::NotRunning)?;

        self.shared.request_stop();
        self.frames.lock().take();

        if handle.join().is_err() {
            warn!("Tracking thread panicked");
        }
        self.shared.set_state(TrackerState::Stopped);
        info!("Marker tracker stopped");
        Ok(())
    }
}

impl Tracker for MarkerTracker {
    fn tracker_type(&self) -> TrackerType {
        TrackerType::Marker
    }

    fn start(&self) -> Result<()> {
        self.start_tracking()
    }

    fn stop(&self) -> Result<()> {
        self.stop_tracking()
    }

    fn state(&self) -> TrackerState {
        self.shared.state()
    }

    fn deinit(&self) {
        match self.stop_tracking() {
            Ok(()) | Err(TrackerError::NotRunning) => {}
            Err(e) => warn!("Stopping tracker during deinit failed: {}", e),
        }
        self.shared.deinit();
        info!("Marker tracker deinitialized");
    }
}

impl Drop for MarkerTracker {
    fn drop(&mut self) {
        if self.worker.get_mut().is_some() {
            let _ = self.stop_tracking();
        }
    }
}

/// Marker operations handed to the update callback.
///
/// Same semantics as the corresponding `MarkerTracker` methods; inside the
/// callback they never wait on a cycle.
#[derive(Clone)]
pub struct MarkerAccess {
    shared: Arc<SharedState>,
}

impl MarkerAccess {
    pub(crate) fn new(shared: Arc<SharedState>) -> Self {
        Self { shared }
    }

    pub fn create_frame_marker(
        &self,
        id: i32,
        name: &str,
        size: impl Into<MarkerSize>,
    ) -> Result<MarkerHandle> {
        self.shared.create_frame_marker(id, name, size.into())
    }

    pub fn destroy_marker(&self, handle: MarkerHandle) -> Result<Marker> {
        self.shared.destroy_marker(handle)
    }

    pub fn set_marker_size(&self, handle: MarkerHandle, size: impl Into<MarkerSize>) -> Result<()> {
        self.shared.set_marker_size(handle, size.into())
    }

    pub fn num_markers(&self) -> usize {
        self.shared.num_markers()
    }

    pub fn marker(&self, index: usize) -> Option<Marker> {
        self.shared.marker(index)
    }

    pub fn find_marker(&self, handle: MarkerHandle) -> Option<Marker> {
        self.shared.find_marker(handle)
    }

    pub fn find_marker_by_id(&self, id: i32) -> Option<Marker> {
        self.shared.find_marker_by_id(id)
    }

    pub fn state(&self) -> TrackerState {
        self.shared.state()
    }

    /// Ask the tracking loop to stop after the current callback returns.
    pub fn request_stop(&self) {
        self.shared.request_stop();
    }
}
