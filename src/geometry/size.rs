//! Physical extent of a planar marker.

use nalgebra::Vector2;

/// Width and height of a marker in scene units (the same units the
/// reported pose translations use).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerSize(pub Vector2<f32>);

impl MarkerSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self(Vector2::new(width, height))
    }

    pub fn width(&self) -> f32 {
        self.0.x
    }

    pub fn height(&self) -> f32 {
        self.0.y
    }

    /// A size is usable when both extents are finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.0.iter().all(|v| v.is_finite() && *v > 0.0)
    }
}

impl From<Vector2<f32>> for MarkerSize {
    fn from(v: Vector2<f32>) -> Self {
        Self(v)
    }
}

impl From<(f32, f32)> for MarkerSize {
    fn from((width, height): (f32, f32)) -> Self {
        Self::new(width, height)
    }
}

impl std::fmt::Display for MarkerSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width(), self.height())
    }
}
