//! Tracking thread loop.
//!
//! Per frame:
//! 1. Run a cycle under the cycle lock (state `CycleActive`)
//! 2. Publish the result for polling
//! 3. Invoke the update callback (lock released, state `Idle`)
//! 4. Dispatch the result to the render handler, if any

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, info};

use crate::camera::CameraFrame;
use crate::system::shared_state::SharedState;
use crate::tracking::marker_tracker::MarkerAccess;
use crate::tracking::state::TrackerState;

/// Tracking thread state.
pub struct TrackingWorker {
    shared: Arc<SharedState>,

    /// Handed to the update callback.
    access: MarkerAccess,

    /// Receive timeout; bounds how long a stop request can go unnoticed
    /// while no frames arrive.
    poll_interval: Duration,
}

impl TrackingWorker {
    pub fn new(shared: Arc<SharedState>, poll_interval: Duration) -> Self {
        let access = MarkerAccess::new(shared.clone());
        Self {
            shared,
            access,
            poll_interval,
        }
    }

    /// Main thread loop: receive frames and track them.
    ///
    /// This runs until a stop is requested or the frame channel is closed.
    pub fn run(self, frames: Receiver<CameraFrame>) {
        self.shared
            .set_tracking_thread(Some(std::thread::current().id()));
        info!("Tracking thread started");
        let mut frames_tracked: u64 = 0;

        loop {
            if self.shared.is_stop_requested() {
                break;
            }

            match frames.recv_timeout(self.poll_interval) {
                Ok(frame) => {
                    if !self.process_frame(frame) {
                        break;
                    }
                    frames_tracked += 1;
                }
                Err(RecvTimeoutError::Timeout) => {
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("Frame channel disconnected");
                    break;
                }
            }
        }

        self.shared.set_state(TrackerState::Stopped);
        self.shared.set_tracking_thread(None);
        info!("Tracking thread exiting after {} frames", frames_tracked);
    }

    /// Track one frame. Returns false when the loop should exit.
    fn process_frame(&self, frame: CameraFrame) -> bool {
        let Some(result) = self.shared.run_cycle(&frame) else {
            return false;
        };
        let result = Arc::new(result);

        debug!(
            "Frame {}: {}/{} markers tracked ({:.2} ms, {:.2} ms waiting on mutations)",
            result.frame_index,
            result.num_tracked(),
            result.num_registered,
            result.timing.total_ms,
            result.timing.lock_wait_ms
        );

        self.shared.publish(result.clone());
        self.shared.update.invoke(&self.access, &result);
        self.shared.render.dispatch(&result);
        true
    }
}
