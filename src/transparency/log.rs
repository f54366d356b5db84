//! Counters describing what the pipeline observed and sent.
//!
//! Only counts are kept; no input ids, URLs, or session ids end up here.

use crate::core::EventKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Transparency statistics for one page visit.
#[derive(Debug)]
pub struct TransparencyLog {
    /// Signals handled by an active watcher
    signals_observed: AtomicU64,
    /// Signals dropped because no watcher was active yet
    signals_ignored: AtomicU64,
    resize_events_sent: AtomicU64,
    paste_events_sent: AtomicU64,
    time_taken_events_sent: AtomicU64,
    /// Events lost to transport or collector errors
    events_failed: AtomicU64,
    started_at: DateTime<Utc>,
}

impl TransparencyLog {
    /// Create a new transparency log.
    pub fn new() -> Self {
        Self {
            signals_observed: AtomicU64::new(0),
            signals_ignored: AtomicU64::new(0),
            resize_events_sent: AtomicU64::new(0),
            paste_events_sent: AtomicU64::new(0),
            time_taken_events_sent: AtomicU64::new(0),
            events_failed: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    pub fn record_signal_observed(&self) {
        self.signals_observed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_signal_ignored(&self) {
        self.signals_ignored.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an event the collector accepted.
    pub fn record_event_sent(&self, kind: EventKind) {
        let counter = match kind {
            EventKind::WindowResize => &self.resize_events_sent,
            EventKind::CopyAndPaste => &self.paste_events_sent,
            EventKind::TimeTaken => &self.time_taken_events_sent,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an event that was lost.
    pub fn record_event_failed(&self) {
        self.events_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> TransparencyStats {
        TransparencyStats {
            signals_observed: self.signals_observed.load(Ordering::Relaxed),
            signals_ignored: self.signals_ignored.load(Ordering::Relaxed),
            resize_events_sent: self.resize_events_sent.load(Ordering::Relaxed),
            paste_events_sent: self.paste_events_sent.load(Ordering::Relaxed),
            time_taken_events_sent: self.time_taken_events_sent.load(Ordering::Relaxed),
            events_failed: self.events_failed.load(Ordering::Relaxed),
            started_at: self.started_at,
            duration_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Visit Statistics:\n\
             - Signals observed: {}\n\
             - Signals before session (ignored): {}\n\
             - Resize events sent: {}\n\
             - Paste events sent: {}\n\
             - Time-to-submit events sent: {}\n\
             - Events lost: {}\n\
             - Duration: {} seconds\n\
             \n\
             Privacy Guarantee:\n\
             - No pasted content captured\n\
             - No key content captured\n\
             - Only input ids, viewport sizes and timings are sent",
            stats.signals_observed,
            stats.signals_ignored,
            stats.resize_events_sent,
            stats.paste_events_sent,
            stats.time_taken_events_sent,
            stats.events_failed,
            stats.duration_secs
        )
    }
}

impl Default for TransparencyLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of transparency statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransparencyStats {
    pub signals_observed: u64,
    pub signals_ignored: u64,
    pub resize_events_sent: u64,
    pub paste_events_sent: u64,
    pub time_taken_events_sent: u64,
    pub events_failed: u64,
    pub started_at: DateTime<Utc>,
    pub duration_secs: u64,
}

impl TransparencyStats {
    /// Events the collector accepted, across all kinds.
    pub fn events_sent(&self) -> u64 {
        self.resize_events_sent + self.paste_events_sent + self.time_taken_events_sent
    }
}

/// Thread-safe shared transparency log.
pub type SharedTransparencyLog = Arc<TransparencyLog>;

/// Create a new shared transparency log.
pub fn create_shared_log() -> SharedTransparencyLog {
    Arc::new(TransparencyLog::new())
}
