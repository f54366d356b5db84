//! First paste into each input.

use crate::core::{Event, SharedSession};
use std::collections::HashSet;

/// Inputs that have already been reported. Only ever grows.
#[derive(Debug, Default)]
pub struct PasteTracker {
    reported: HashSet<String>,
}

impl PasteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `input_id` as reported. Returns `true` the first time only.
    pub fn mark(&mut self, input_id: &str) -> bool {
        if self.reported.contains(input_id) {
            return false;
        }
        self.reported.insert(input_id.to_string())
    }
}

/// Reports the first paste into every distinct input for the whole session.
///
/// Inputs without an id share the empty key, so they are reported once
/// between them.
#[derive(Debug)]
pub struct PasteWatcher {
    session: SharedSession,
    tracker: PasteTracker,
}

impl PasteWatcher {
    pub fn new(session: SharedSession) -> Self {
        Self {
            session,
            tracker: PasteTracker::new(),
        }
    }

    /// Handle a paste into `input_id`.
    pub fn on_paste(&mut self, input_id: &str) -> Option<Event> {
        if !self.tracker.mark(input_id) {
            return None;
        }
        Some(Event::copy_and_paste(&self.session, input_id))
    }
}
