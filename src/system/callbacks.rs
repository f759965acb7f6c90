//! Per-frame callbacks invoked from the tracking thread.
//!
//! Both callbacks run after the cycle has released the registry lock:
//! - `UpdateCallback` is the application's mutation window. It receives a
//!   `MarkerAccess`, and create/destroy through it never wait on a cycle.
//! - `RenderHandler` draws the cycle's result. Only one is ever active;
//!   the first registration wins and later ones are refused. Without a
//!   handler the application polls `MarkerTracker::latest_result` and
//!   schedules its own rendering.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::{Result, TrackerError};
use crate::tracking::marker_tracker::MarkerAccess;
use crate::tracking::result::TrackingResult;

/// Application hook run once per frame in the callback window.
pub trait UpdateCallback: Send {
    fn on_update(&mut self, markers: &MarkerAccess, result: &TrackingResult);
}

impl<F> UpdateCallback for F
where
    F: FnMut(&MarkerAccess, &TrackingResult) + Send,
{
    fn on_update(&mut self, markers: &MarkerAccess, result: &TrackingResult) {
        self(markers, result)
    }
}

/// Per-frame draw call. No return value is expected.
pub trait RenderHandler: Send + Sync {
    fn render(&self, result: &TrackingResult);
}

impl<F> RenderHandler for F
where
    F: Fn(&TrackingResult) + Send + Sync,
{
    fn render(&self, result: &TrackingResult) {
        self(result)
    }
}

type SharedUpdate = Arc<Mutex<dyn UpdateCallback>>;

/// Slot for the update callback.
///
/// The slot lock is only held to swap or clone the entry, never while the
/// callback runs, so the callback may replace or clear itself.
#[derive(Default)]
pub struct UpdateSlot {
    callback: Mutex<Option<SharedUpdate>>,
}

impl UpdateSlot {
    pub fn set<C: UpdateCallback + 'static>(&self, callback: C) {
        let callback: SharedUpdate = Arc::new(Mutex::new(callback));
        *self.callback.lock() = Some(callback);
    }

    /// Remove the callback, returning whether one was set.
    pub fn clear(&self) -> bool {
        self.callback.lock().take().is_some()
    }

    pub fn is_set(&self) -> bool {
        self.callback.lock().is_some()
    }

    pub(crate) fn invoke(&self, markers: &MarkerAccess, result: &TrackingResult) {
        let callback = self.callback.lock().clone();
        if let Some(callback) = callback {
            callback.lock().on_update(markers, result);
        }
    }
}

/// Holds the single render handler.
#[derive(Default)]
pub struct RenderDispatcher {
    handler: RwLock<Option<Arc<dyn RenderHandler>>>,
}

impl RenderDispatcher {
    /// Register the render handler. Fails if one is already registered.
    pub fn register<H: RenderHandler + 'static>(&self, handler: H) -> Result<()> {
        let mut slot = self.handler.write();
        if slot.is_some() {
            return Err(TrackerError::RenderHandlerRegistered);
        }
        *slot = Some(Arc::new(handler));
        Ok(())
    }

    pub fn unregister(&self) -> bool {
        self.handler.write().take().is_some()
    }

    pub fn has_handler(&self) -> bool {
        self.handler.read().is_some()
    }

    /// Render `result`. Returns false when no handler is registered.
    pub fn dispatch(&self, result: &TrackingResult) -> bool {
        let handler = self.handler.read().clone();
        match handler {
            Some(handler) => {
                handler.render(result);
                true
            }
            None => false,
        }
    }
}
