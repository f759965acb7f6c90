//! Camera boundary: device lifecycle flags and the frames fed to trackers.

pub mod device;
pub mod frame;

pub use device::{CameraDevice, CameraStatus};
pub use frame::{CameraFrame, MarkerDetection};
