//! Instrumentation units activated once a session exists.
//!
//! Each watcher is a small state machine fed with timestamped page signals.
//! None of them perform I/O: they return the [`Event`](crate::core::Event)
//! to send and leave dispatch to the runtime.

pub mod paste;
pub mod resize;
pub mod submit;

pub use paste::{PasteTracker, PasteWatcher};
pub use resize::ResizeWatcher;
pub use submit::{elapsed_seconds, SubmitState, SubmitTimer};

/// One-shot listener state: armed until the first trigger, then fired for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Armed,
    Fired,
}

impl WatchState {
    pub fn is_armed(&self) -> bool {
        matches!(self, WatchState::Armed)
    }

    pub fn is_fired(&self) -> bool {
        matches!(self, WatchState::Fired)
    }
}
