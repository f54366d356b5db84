//! Time from the first keystroke in any input to form submission.

use crate::core::{Event, SharedSession};
use chrono::{DateTime, Utc};

/// Lifecycle of a [`SubmitTimer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    /// Listening for the first keystroke
    AwaitingKeystroke,
    /// Keystroke seen, listening for the form submission
    Timing { started_at: DateTime<Utc> },
    /// Submission reported; no longer listening
    Fired,
}

/// Measures the time taken to fill in the form.
///
/// The clock starts at the first keystroke across all inputs, not per input,
/// and the first submission after that stops it.
#[derive(Debug)]
pub struct SubmitTimer {
    session: SharedSession,
    state: SubmitState,
}

impl SubmitTimer {
    pub fn new(session: SharedSession) -> Self {
        Self {
            session,
            state: SubmitState::AwaitingKeystroke,
        }
    }

    /// Handle a key release. Returns `true` if this started the clock.
    pub fn on_key_up(&mut self, at: DateTime<Utc>) -> bool {
        if self.state != SubmitState::AwaitingKeystroke {
            return false;
        }
        self.state = SubmitState::Timing { started_at: at };
        true
    }

    /// Whether a submission right now would be intercepted.
    pub fn intercepts_submit(&self) -> bool {
        matches!(self.state, SubmitState::Timing { .. })
    }

    /// Handle a form submission.
    ///
    /// Returns the event to send when the clock was running; the caller must
    /// then let the submission proceed. Submissions before the first
    /// keystroke, or after the timer fired, are left alone.
    pub fn on_submit(&mut self, at: DateTime<Utc>) -> Option<Event> {
        let SubmitState::Timing { started_at } = self.state else {
            return None;
        };
        self.state = SubmitState::Fired;
        Some(Event::time_taken(
            &self.session,
            elapsed_seconds(started_at, at),
        ))
    }

    pub fn state(&self) -> SubmitState {
        self.state
    }
}

/// Whole seconds between `start` and `end`, rounded half up, never negative.
pub fn elapsed_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    let millis = (end - start).num_milliseconds().max(0) as u64;
    (millis + 500) / 1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SessionContext;
    use chrono::Duration;
    use std::sync::Arc;

    fn timer() -> SubmitTimer {
        SubmitTimer::new(Arc::new(
            SessionContext::new("abc123", "https://a.example").unwrap(),
        ))
    }

    fn seconds_of(event: Event) -> u64 {
        match event {
            Event::TimeTaken { time_seconds, .. } => time_seconds,
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_rounding() {
        let t0 = Utc::now();
        assert_eq!(elapsed_seconds(t0, t0), 0);
        assert_eq!(elapsed_seconds(t0, t0 + Duration::milliseconds(499)), 0);
        assert_eq!(elapsed_seconds(t0, t0 + Duration::milliseconds(500)), 1);
        assert_eq!(elapsed_seconds(t0, t0 + Duration::milliseconds(12_400)), 12);
        assert_eq!(elapsed_seconds(t0, t0 - Duration::seconds(3)), 0);
    }

    #[test]
    fn test_measures_from_first_keystroke() {
        let mut timer = timer();
        let t0 = Utc::now();

        assert!(timer.on_key_up(t0));
        assert!(!timer.on_key_up(t0 + Duration::seconds(5)));
        assert!(timer.intercepts_submit());

        let event = timer
            .on_submit(t0 + Duration::milliseconds(7_600))
            .expect("submission after typing is reported");
        assert_eq!(seconds_of(event), 8);
        assert_eq!(timer.state(), SubmitState::Fired);
    }

    #[test]
    fn test_submit_before_typing_is_ignored() {
        let mut timer = timer();
        assert!(!timer.intercepts_submit());
        assert!(timer.on_submit(Utc::now()).is_none());
        assert_eq!(timer.state(), SubmitState::AwaitingKeystroke);

        // Typing afterwards still arms the timer
        assert!(timer.on_key_up(Utc::now()));
    }

    #[test]
    fn test_reports_only_first_submission() {
        let mut timer = timer();
        let t0 = Utc::now();
        timer.on_key_up(t0);
        assert!(timer.on_submit(t0 + Duration::seconds(2)).is_some());
        assert!(timer.on_submit(t0 + Duration::seconds(4)).is_none());
        assert!(!timer.on_key_up(t0 + Duration::seconds(5)));
        assert!(!timer.intercepts_submit());
    }
}
