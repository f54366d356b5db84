//! Event dispatch to the collector.
//!
//! Each event becomes one JSON `POST`. Nothing is retried, queued, or
//! buffered: a failed event is logged, counted, and lost.

use crate::config::Config;
use crate::core::{Event, EventKind};
use crate::transparency::SharedTransparencyLog;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Build the HTTP client shared by bootstrap and dispatch.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, DispatchError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DispatchError::Config(format!("Failed to create HTTP client: {e}")))
}

/// Dispatch error types.
#[derive(Debug)]
pub enum DispatchError {
    /// HTTP client could not be set up
    Config(String),
    /// Event carries no session id and was not sent
    MissingSession,
    /// Network/HTTP error
    Network(String),
    /// Collector returned an error response
    Server { status: u16, message: String },
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchError::Config(msg) => write!(f, "Dispatch config error: {msg}"),
            DispatchError::MissingSession => write!(f, "Event has no session id"),
            DispatchError::Network(msg) => write!(f, "Dispatch network error: {msg}"),
            DispatchError::Server { status, message } => {
                write!(f, "Collector error ({status}): {message}")
            }
        }
    }
}

impl std::error::Error for DispatchError {}

/// Sends events to the collector.
///
/// Cheap to clone: clones share the connection pool and the transparency log.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    client: reqwest::Client,
    config: Arc<Config>,
    log: SharedTransparencyLog,
}

impl EventDispatcher {
    pub fn new(client: reqwest::Client, config: Arc<Config>, log: SharedTransparencyLog) -> Self {
        Self {
            client,
            config,
            log,
        }
    }

    /// URL events of `kind` are posted to.
    pub fn endpoint(&self, kind: EventKind) -> String {
        self.config.event_url(kind)
    }

    /// Post one event and wait for the collector to answer.
    ///
    /// Events without a session id are refused without a request. Failures are logged and counted before being returned; callers are
    /// free to ignore the result.
    pub async fn send(&self, event: &Event) -> Result<(), DispatchError> {
        let kind = event.kind();
        let result = self.post(event).await;

        match &result {
            Ok(()) => {
                tracing::debug!(event_type = %kind, "event sent");
                self.log.record_event_sent(kind);
            }
            Err(e) => {
                tracing::warn!(event_type = %kind, "Failed to send event: {}", e);
                self.log.record_event_failed();
            }
        }

        result
    }

    /// Send an event without waiting for it.
    ///
    /// The request is tracked in `in_flight` so it can be allowed to finish;
    /// it is never aborted.
    pub fn dispatch(&self, event: Event, in_flight: &mut JoinSet<()>) {
        let dispatcher = self.clone();
        in_flight.spawn(async move {
            let _ = dispatcher.send(&event).await;
        });
    }

    async fn post(&self, event: &Event) -> Result<(), DispatchError> {
        if event.session_id().trim().is_empty() {
            return Err(DispatchError::MissingSession);
        }

        let response = self
            .client
            .post(self.endpoint(event.kind()))
            .header("Content-Type", "application/json")
            .json(event)
            .send()
            .await
            .map_err(|e| DispatchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DispatchError::Server {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointLayout;
    use crate::core::SessionContext;
    use crate::transparency::create_shared_log;

    fn dispatcher(config: Config) -> EventDispatcher {
        let client = build_http_client(Duration::from_millis(500)).unwrap();
        EventDispatcher::new(client, Arc::new(config), create_shared_log())
    }

    #[test]
    fn test_endpoint_selection() {
        let per_event = dispatcher(Config::default());
        assert_eq!(
            per_event.endpoint(EventKind::CopyAndPaste),
            "http://localhost:5000/new_cp_event"
        );

        let unified = dispatcher(Config {
            endpoints: EndpointLayout::Unified,
            ..Config::default()
        });
        assert_eq!(
            unified.endpoint(EventKind::WindowResize),
            "http://localhost:5000/new_event"
        );
    }

    #[test]
    fn test_error_display() {
        let err = DispatchError::Server {
            status: 503,
            message: "busy".to_string(),
        };
        assert_eq!(err.to_string(), "Collector error (503): busy");
    }

    #[tokio::test]
    async fn test_unreachable_collector_is_counted_not_raised() {
        // Port 9 (discard) on localhost is closed on any sane test host.
        let dispatcher = dispatcher(Config {
            collector_url: "http://127.0.0.1:9".to_string(),
            ..Config::default()
        });
        let session = SessionContext::new("abc123", "https://a.example").unwrap();

        let mut in_flight = JoinSet::new();
        dispatcher.dispatch(Event::copy_and_paste(&session, "email"), &mut in_flight);
        while in_flight.join_next().await.is_some() {}

        let stats = dispatcher.log.stats();
        assert_eq!(stats.events_failed, 1);
        assert_eq!(stats.events_sent(), 0);
    }

    #[tokio::test]
    async fn test_event_without_session_is_refused() {
        let dispatcher = dispatcher(Config {
            collector_url: "http://127.0.0.1:9".to_string(),
            ..Config::default()
        });
        let event = Event::CopyAndPaste {
            website_url: "https://a.example".to_string(),
            session_id: String::new(),
            input_id: "email".to_string(),
        };

        let result = dispatcher.send(&event).await;

        assert!(matches!(result, Err(DispatchError::MissingSession)));
        assert_eq!(dispatcher.log.stats().events_failed, 1);
    }
}
