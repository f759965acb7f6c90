//! Tracker lifecycle state machine.
//!
//! ```text
//!            start()                 frame received
//!  Stopped ----------> Idle --------------------------> CycleActive
//!     ^                 ^  <--------------------------      |
//!     |                 |      cycle done (lock released)   |
//!     +-----------------+-----------------------------------+
//!          stop()  (waits for an active cycle to finish)
//! ```
//!
//! Marker mutation proceeds immediately in `Stopped` and `Idle`; in
//! `CycleActive` it blocks until the cycle releases the registry.

use std::sync::atomic::{AtomicU8, Ordering};

/// State of a tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackerState {
    /// No tracking thread.
    #[default]
    Stopped,
    /// Running, between cycles (the callback window).
    Idle,
    /// Running, a tracking cycle holds the registry.
    CycleActive,
}

impl TrackerState {
    pub fn is_running(self) -> bool {
        !matches!(self, TrackerState::Stopped)
    }

    fn to_u8(self) -> u8 {
        match self {
            TrackerState::Stopped => 0,
            TrackerState::Idle => 1,
            TrackerState::CycleActive => 2,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => TrackerState::Idle,
            2 => TrackerState::CycleActive,
            _ => TrackerState::Stopped,
        }
    }
}

impl std::fmt::Display for TrackerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TrackerState::Stopped => "stopped",
            TrackerState::Idle => "idle",
            TrackerState::CycleActive => "cycle-active",
        };
        f.write_str(s)
    }
}

/// Lock-free mirror of a `TrackerState`, readable while a cycle holds the
/// registry lock.
#[derive(Debug, Default)]
pub struct AtomicTrackerState(AtomicU8);

impl AtomicTrackerState {
    pub fn new(state: TrackerState) -> Self {
        Self(AtomicU8::new(state.to_u8()))
    }

    pub fn load(&self) -> TrackerState {
        TrackerState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub fn store(&self, state: TrackerState) {
        self.0.store(state.to_u8(), Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_roundtrip() {
        let state = AtomicTrackerState::default();
        assert_eq!(state.load(), TrackerState::Stopped);

        for s in [TrackerState::Idle, TrackerState::CycleActive, TrackerState::Stopped] {
            state.store(s);
            assert_eq!(state.load(), s);
        }
    }

    #[test]
    fn test_is_running() {
        assert!(!TrackerState::Stopped.is_running());
        assert!(TrackerState::Idle.is_running());
        assert!(TrackerState::CycleActive.is_running());
    }
}
