//! Shared state between the application thread and a tracking thread.
//!
//! The `SharedState` struct holds everything a `MarkerTracker` and its
//! tracking thread both touch. The marker registry and the detector sit
//! behind a single mutex, the cycle lock: the tracking thread holds it for
//! exactly one cycle, and marker mutations take it too, so a mutation
//! either fully precedes or fully follows any cycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::ThreadId;
use std::time::Instant;

use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::camera::CameraFrame;
use crate::error::{Result, TrackerError};
use crate::geometry::MarkerSize;
use crate::markers::{Marker, MarkerHandle, MarkerRegistry};
use crate::tracking::detector::MarkerDetector;
use crate::tracking::result::{TimingStats, TrackingResult};
use crate::tracking::state::{AtomicTrackerState, TrackerState};

use super::callbacks::{RenderDispatcher, UpdateSlot};

/// Data guarded by the cycle lock.
pub struct CycleState {
    pub registry: MarkerRegistry,
    pub detector: Box<dyn MarkerDetector>,
}

/// State shared by a `MarkerTracker` handle and its tracking thread.
pub struct SharedState {
    /// Registry + detector. Held by the tracking thread for one cycle at a time.
    cycle: Mutex<CycleState>,

    /// Mirror of the lifecycle state, readable without the cycle lock.
    state: AtomicTrackerState,

    /// Request the tracking thread to exit before its next cycle.
    stop_requested: AtomicBool,

    /// Set once by deinit; every later operation fails.
    deinitialized: AtomicBool,

    /// Thread id of the live tracking thread, if any.
    tracking_thread: Mutex<Option<ThreadId>>,

    /// Result of the most recent cycle.
    latest: RwLock<Option<Arc<TrackingResult>>>,

    /// Number of completed cycles since creation.
    cycles_completed: AtomicU64,

    pub update: UpdateSlot,
    pub render: RenderDispatcher,
}

impl SharedState {
    pub fn new(registry: MarkerRegistry, detector: Box<dyn MarkerDetector>) -> Arc<Self> {
        Arc::new(Self {
            cycle: Mutex::new(CycleState { registry, detector }),
            state: AtomicTrackerState::new(TrackerState::Stopped),
            stop_requested: AtomicBool::new(false),
            deinitialized: AtomicBool::new(false),
            tracking_thread: Mutex::new(None),
            latest: RwLock::new(None),
            cycles_completed: AtomicU64::new(0),
            update: UpdateSlot::default(),
            render: RenderDispatcher::default(),
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle flags
    // ─────────────────────────────────────────────────────────────────────────

    pub fn state(&self) -> TrackerState {
        self.state.load()
    }

    pub(crate) fn set_state(&self, state: TrackerState) {
        self.state.store(state);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    pub(crate) fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    pub(crate) fn clear_stop_request(&self) {
        self.stop_requested.store(false, Ordering::SeqCst);
    }

    pub fn is_deinitialized(&self) -> bool {
        self.deinitialized.load(Ordering::SeqCst)
    }

    pub(crate) fn set_tracking_thread(&self, id: Option<ThreadId>) {
        *self.tracking_thread.lock() = id;
    }

    /// True when called from this tracker's tracking thread.
    pub fn is_tracking_thread(&self) -> bool {
        *self.tracking_thread.lock() == Some(std::thread::current().id())
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed.load(Ordering::SeqCst)
    }

    pub fn latest_result(&self) -> Option<Arc<TrackingResult>> {
        self.latest.read().clone()
    }

    pub(crate) fn publish(&self, result: Arc<TrackingResult>) {
        *self.latest.write() = Some(result);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Cycle lock
    // ─────────────────────────────────────────────────────────────────────────

    /// Acquire the cycle lock, blocking while a cycle is active.
    fn lock_cycle(&self) -> Result<MutexGuard<'_, CycleState>> {
        let guard = self.cycle.lock();
        if self.is_deinitialized() {
            return Err(TrackerError::Deinitialized);
        }
        Ok(guard)
    }

    /// Run one tracking cycle over `frame`.
    ///
    /// Returns `None` without touching the registry when a stop or deinit
    /// was requested while waiting for the lock.
    pub(crate) fn run_cycle(&self, frame: &CameraFrame) -> Option<TrackingResult> {
        let t_start = Instant::now();
        let mut cycle = self.cycle.lock();
        if self.is_stop_requested() || self.is_deinitialized() {
            return None;
        }
        let t_locked = Instant::now();
        self.set_state(TrackerState::CycleActive);

        let CycleState { registry, detector } = &mut *cycle;
        let markers = detector.detect(frame, registry);
        let registry_revision = registry.revision();
        let num_registered = registry.count();

        self.set_state(TrackerState::Idle);
        drop(cycle);

        let t_end = Instant::now();
        self.cycles_completed.fetch_add(1, Ordering::SeqCst);

        Some(TrackingResult {
            frame_index: frame.index,
            timestamp_ns: frame.timestamp_ns,
            markers,
            registry_revision,
            num_registered,
            timing: TimingStats {
                lock_wait_ms: (t_locked - t_start).as_secs_f64() * 1e3,
                detect_ms: (t_end - t_locked).as_secs_f64() * 1e3,
                total_ms: (t_end - t_start).as_secs_f64() * 1e3,
            },
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Marker operations (all under the cycle lock)
    // ─────────────────────────────────────────────────────────────────────────

    pub fn create_frame_marker(&self, id: i32, name: &str, size: MarkerSize) -> Result<MarkerHandle> {
        self.lock_cycle()?.registry.create(id, name, size)
    }

    pub fn destroy_marker(&self, handle: MarkerHandle) -> Result<Marker> {
        self.lock_cycle()?
            .registry
            .destroy(handle)
            .ok_or(TrackerError::UnknownMarker(handle))
    }

    pub fn set_marker_size(&self, handle: MarkerHandle, size: MarkerSize) -> Result<()> {
        self.lock_cycle()?.registry.set_size(handle, size)
    }

    pub fn num_markers(&self) -> usize {
        self.lock_cycle().map(|c| c.registry.count()).unwrap_or(0)
    }

    pub fn marker(&self, index: usize) -> Option<Marker> {
        self.lock_cycle().ok()?.registry.get(index).cloned()
    }

    pub fn find_marker(&self, handle: MarkerHandle) -> Option<Marker> {
        self.lock_cycle().ok()?.registry.find(handle).cloned()
    }

    pub fn find_marker_by_id(&self, id: i32) -> Option<Marker> {
        self.lock_cycle().ok()?.registry.find_by_id(id).cloned()
    }

    pub(crate) fn replace_detector(&self, detector: Box<dyn MarkerDetector>) -> Result<()> {
        self.lock_cycle()?.detector = detector;
        Ok(())
    }

    /// Mark the tracker dead and release its markers and callbacks.
    ///
    /// Takes the cycle lock, so it waits for an in-flight cycle.
    pub(crate) fn deinit(&self) {
        let mut cycle = self.cycle.lock();
        self.deinitialized.store(true, Ordering::SeqCst);
        cycle.registry.clear();
        drop(cycle);

        self.update.clear();
        self.render.unregister();
        *self.latest.write() = None;
    }
}
