//! Debounced capture of the first viewport resize.
//!
//! Each resize pushes a single pending deadline forward. Only when the
//! deadline passes without another resize does the watcher fire, and it
//! fires once for its whole lifetime.

use crate::core::{Event, SharedSession, Viewport};
use crate::watchers::WatchState;
use chrono::{DateTime, Duration, Utc};

/// Watches for the first settled resize of the page.
#[derive(Debug)]
pub struct ResizeWatcher {
    session: SharedSession,
    /// Viewport when the watcher was activated
    from: Viewport,
    /// Viewport reported by the most recent resize
    latest: Viewport,
    debounce: Duration,
    /// When the pending resize settles, if one is pending
    pending: Option<DateTime<Utc>>,
    state: WatchState,
}

impl ResizeWatcher {
    /// Activate the watcher with the viewport the page has right now.
    pub fn new(session: SharedSession, initial: Viewport, debounce: std::time::Duration) -> Self {
        Self {
            session,
            from: initial,
            latest: initial,
            debounce: Duration::from_std(debounce).unwrap_or_else(|_| Duration::seconds(1)),
            pending: None,
            state: WatchState::Armed,
        }
    }

    /// Handle a resize occurrence. Resets the pending deadline.
    ///
    /// A resize stamped at or after the pending deadline comes after the
    /// quiet period: the earlier resize settles first and is returned, and
    /// this one is not watched.
    pub fn on_resize(&mut self, viewport: Viewport, at: DateTime<Utc>) -> Option<Event> {
        if self.state.is_fired() {
            return None;
        }
        if let Some(settled) = self.poll(at) {
            return Some(settled);
        }
        self.latest = viewport;
        self.pending = Some(at + self.debounce);
        None
    }

    /// When the pending resize settles, if any.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.pending
    }

    /// Fire if the quiet period has elapsed by `now`.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<Event> {
        match self.pending {
            Some(deadline) if now >= deadline && self.state.is_armed() => {
                self.pending = None;
                self.state = WatchState::Fired;
                Some(Event::window_resize(&self.session, self.from, self.latest))
            }
            _ => None,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }
}
