//! Tracker orchestration: the manager, the state shared with tracking
//! threads, and the per-frame callbacks.

pub mod callbacks;
mod manager;
pub mod shared_state;

pub use callbacks::{RenderDispatcher, RenderHandler, UpdateCallback, UpdateSlot};
pub use manager::TrackerManager;
pub use shared_state::SharedState;
