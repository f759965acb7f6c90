pub mod camera;
pub mod config;
pub mod error;
pub mod geometry;
pub mod markers;
pub mod system;
pub mod tracking;

pub use error::{Result, TrackerError};
