//! Geometry utilities: SE3 poses and planar marker extents.

pub mod se3;
pub mod size;

pub use se3::SE3;
pub use size::MarkerSize;
