//! Camera device lifecycle.
//!
//! Image acquisition is out of scope; this type only tracks whether the
//! device is initialized or running so the tracker manager can refuse
//! tracker init/deinit while it is.

use parking_lot::{Mutex, MutexGuard};
use tracing::info;

use crate::error::{Result, TrackerError};

/// Lifecycle state of the camera device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraStatus {
    #[default]
    Uninitialized,
    Initialized,
    Running,
}

impl CameraStatus {
    /// True when the device is initialized or running.
    pub fn is_initialized(self) -> bool {
        !matches!(self, CameraStatus::Uninitialized)
    }
}

impl std::fmt::Display for CameraStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CameraStatus::Uninitialized => "uninitialized",
            CameraStatus::Initialized => "initialized",
            CameraStatus::Running => "running",
        };
        f.write_str(s)
    }
}

/// Camera device state shared between the application and the tracker
/// manager.
#[derive(Debug, Default)]
pub struct CameraDevice {
    status: Mutex<CameraStatus>,
}

impl CameraDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> CameraStatus {
        *self.status.lock()
    }

    pub fn is_initialized(&self) -> bool {
        self.status().is_initialized()
    }

    /// Uninitialized -> Initialized.
    pub fn init(&self) -> Result<()> {
        self.transition("init", CameraStatus::Uninitialized, CameraStatus::Initialized)
    }

    /// Initialized -> Running.
    pub fn start(&self) -> Result<()> {
        self.transition("start", CameraStatus::Initialized, CameraStatus::Running)
    }

    /// Running -> Initialized.
    pub fn stop(&self) -> Result<()> {
        self.transition("stop", CameraStatus::Running, CameraStatus::Initialized)
    }

    /// Initialized -> Uninitialized. A running device must be stopped first.
    pub fn deinit(&self) -> Result<()> {
        self.transition("deinit", CameraStatus::Initialized, CameraStatus::Uninitialized)
    }

    /// Hold the status lock. While the guard lives no transition can happen,
    /// which is what makes the manager's precondition check race-free.
    pub(crate) fn lock_status(&self) -> MutexGuard<'_, CameraStatus> {
        self.status.lock()
    }

    fn transition(&self, op: &'static str, from: CameraStatus, to: CameraStatus) -> Result<()> {
        let mut status = self.status.lock();
        if *status != from {
            return Err(TrackerError::CameraTransition { from: *status, op });
        }
        *status = to;
        info!("Camera device {} -> {}", from, to);
        Ok(())
    }
}
