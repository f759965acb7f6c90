//! Marker definitions and the registry that owns them.

pub mod marker;
pub mod registry;
pub mod types;

pub use marker::Marker;
pub use registry::MarkerRegistry;
pub use types::MarkerHandle;
