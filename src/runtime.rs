//! The cooperative loop that ties a page to the telemetry pipeline.
//!
//! ```text
//! page signals ──▶ PageRuntime ──▶ watchers ──▶ EventDispatcher ──▶ collector
//!                      │
//!                      └── SessionBootstrap (once, before any watcher)
//! ```
//!
//! Everything runs on one task. Watchers are plain `&mut` state machines;
//! only dispatches run concurrently, tracked in a [`JoinSet`] so a pending
//! request is never aborted.

use crate::bootstrap::SessionBootstrap;
use crate::config::Config;
use crate::core::SharedSession;
use crate::dispatch::{build_http_client, EventDispatcher};
use crate::page::{PageHost, PageSignal};
use crate::transparency::{create_shared_log, SharedTransparencyLog, TransparencyStats};
use crate::watchers::{PasteWatcher, ResizeWatcher, SubmitTimer};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinSet;

/// What is left once the page unloads.
#[derive(Debug)]
pub struct RunOutcome<H> {
    /// The host, handed back for inspection
    pub host: H,
    /// The session, if bootstrap succeeded
    pub session: Option<SharedSession>,
    /// Counters for the visit
    pub stats: TransparencyStats,
}

/// Drives telemetry for one page visit.
pub struct PageRuntime<H: PageHost> {
    config: Arc<Config>,
    host: H,
    log: SharedTransparencyLog,
}

impl<H: PageHost> PageRuntime<H> {
    pub fn new(config: Config, host: H) -> Self {
        Self {
            config: Arc::new(config),
            host,
            log: create_shared_log(),
        }
    }

    /// Use an existing transparency log instead of a fresh one.
    pub fn with_log(mut self, log: SharedTransparencyLog) -> Self {
        self.log = log;
        self
    }

    pub fn transparency_log(&self) -> SharedTransparencyLog {
        self.log.clone()
    }

    /// Run until `signals` closes (the page unloads).
    ///
    /// Bootstrap runs first. If it fails, no watcher is activated, the signal
    /// channel is dropped, and the run ends immediately.
    pub async fn run(self, mut signals: UnboundedReceiver<PageSignal>) -> RunOutcome<H> {
        let PageRuntime {
            config,
            mut host,
            log,
        } = self;

        let client = match build_http_client(config.request_timeout) {
            Ok(client) => client,
            Err(e) => {
                tracing::error!("Telemetry disabled: {}", e);
                return RunOutcome {
                    host,
                    session: None,
                    stats: log.stats(),
                };
            }
        };

        let bootstrap = SessionBootstrap::new(client.clone(), config.clone());
        let session = match bootstrap.establish(&mut host).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(status = ?e.status(), "Failed to establish session: {}", e);
                drop(signals);
                return RunOutcome {
                    host,
                    session: None,
                    stats: log.stats(),
                };
            }
        };

        let dispatcher = EventDispatcher::new(client, config.clone(), log.clone());
        let mut active = ActiveWatchers::activate(session.clone(), &config, &host, dispatcher);
        let mut in_flight = JoinSet::new();

        tracing::info!(
            viewport = %host.viewport(),
            debounce_ms = config.resize_debounce.as_millis() as u64,
            "watchers active"
        );

        loop {
            let resize_due = active.resize_due_in(Utc::now());

            tokio::select! {
                signal = signals.recv() => match signal {
                    Some(signal) => {
                        if signal.timestamp() < active.activated_at {
                            log.record_signal_ignored();
                            continue;
                        }
                        log.record_signal_observed();
                        active.handle(signal, &mut host, &mut in_flight).await;
                    }
                    None => break,
                },
                _ = tokio::time::sleep(resize_due.unwrap_or_default()), if resize_due.is_some() => {
                    active.poll_resize(Utc::now(), &mut in_flight);
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        tracing::warn!("Dispatch task failed: {}", e);
                    }
                }
            }
        }

        tracing::debug!(pending = in_flight.len(), "page unloading, waiting for in-flight events");
        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                tracing::warn!("Dispatch task failed: {}", e);
            }
        }

        RunOutcome {
            host,
            session: Some(session),
            stats: log.stats(),
        }
    }
}

/// The three watchers of a live session and the dispatcher they feed.
struct ActiveWatchers {
    activated_at: DateTime<Utc>,
    resize: ResizeWatcher,
    paste: PasteWatcher,
    submit: SubmitTimer,
    dispatcher: EventDispatcher,
}

impl ActiveWatchers {
    fn activate<H: PageHost>(
        session: SharedSession,
        config: &Config,
        host: &H,
        dispatcher: EventDispatcher,
    ) -> Self {
        Self {
            activated_at: Utc::now(),
            resize: ResizeWatcher::new(session.clone(), host.viewport(), config.resize_debounce),
            paste: PasteWatcher::new(session.clone()),
            submit: SubmitTimer::new(session),
            dispatcher,
        }
    }

    /// Time left until the pending resize settles.
    fn resize_due_in(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.resize
            .deadline()
            .map(|deadline| (deadline - now).to_std().unwrap_or(Duration::ZERO))
    }

    fn poll_resize(&mut self, now: DateTime<Utc>, in_flight: &mut JoinSet<()>) {
        if let Some(event) = self.resize.poll(now) {
            tracing::debug!("first resize settled");
            self.dispatcher.dispatch(event, in_flight);
        }
    }

    async fn handle<H: PageHost>(
        &mut self,
        signal: PageSignal,
        host: &mut H,
        in_flight: &mut JoinSet<()>,
    ) {
        match signal {
            PageSignal::Resize { viewport, at } => {
                if let Some(event) = self.resize.on_resize(viewport, at) {
                    tracing::debug!("first resize settled");
                    self.dispatcher.dispatch(event, in_flight);
                }
            }
            PageSignal::Paste { input_id, .. } => {
                if let Some(event) = self.paste.on_paste(&input_id) {
                    self.dispatcher.dispatch(event, in_flight);
                }
            }
            PageSignal::KeyUp { at, .. } => {
                if self.submit.on_key_up(at) {
                    tracing::debug!("first keystroke, form timer started");
                }
            }
            PageSignal::Submit { form_id, at } => {
                if !self.submit.intercepts_submit() {
                    return;
                }
                // The submission is held until the event has been sent, then
                // replayed through the host.
                if let Some(event) = self.submit.on_submit(at) {
                    let _ = self.dispatcher.send(&event).await;
                    host.resubmit_form(form_id.as_deref());
                }
            }
        }
    }
}
