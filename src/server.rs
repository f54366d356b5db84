//! Reference collector.
//!
//! A small in-memory HTTP service implementing the collector side of the
//! protocol, for local runs of the `replay` command and for tests:
//! - Issues session ids via `POST /new_session` (or `POST /new`)
//! - Accepts events on the per-kind endpoints and on `POST /new_event`
//! - Folds accepted events into one record per session
//!
//! # Architecture
//!
//! ```text
//! page-telemetry ──→ POST /new_session ──→ collector ──→ { sessionID }
//!                ──→ POST /new_*_event ──→ collector ──→ SessionRecord
//! ```

use crate::bootstrap::{NewSessionRequest, NewSessionResponse};
use crate::core::{Dimension, Event, EventKind};
use axum::{
    extract::State,
    http::{Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
}

impl ServerConfig {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

/// Everything the collector knows about one session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub website_url: String,
    pub session_id: String,
    pub resize_from: Option<Dimension>,
    pub resize_to: Option<Dimension>,
    pub copy_and_paste: BTreeSet<String>,
    pub form_completion_secs: Option<u64>,
}

impl SessionRecord {
    fn new(website_url: String, session_id: String) -> Self {
        Self {
            website_url,
            session_id,
            resize_from: None,
            resize_to: None,
            copy_and_paste: BTreeSet::new(),
            form_completion_secs: None,
        }
    }

    /// Fold an event in. Values already recorded are never replaced.
    fn apply(&mut self, event: &Event) {
        match event {
            Event::WindowResize {
                resize_from,
                resize_to,
                ..
            } => {
                if self.resize_from.is_none() && self.resize_to.is_none() {
                    self.resize_from = Some(resize_from.clone());
                    self.resize_to = Some(resize_to.clone());
                }
            }
            Event::CopyAndPaste { input_id, .. } => {
                self.copy_and_paste.insert(input_id.clone());
            }
            Event::TimeTaken { time_seconds, .. } => {
                if self.form_completion_secs.is_none() && *time_seconds > 0 {
                    self.form_completion_secs = Some(*time_seconds);
                }
            }
        }
    }
}

/// In-memory collector state.
#[derive(Debug, Default)]
pub struct CollectorStore {
    sessions: HashMap<String, SessionRecord>,
    events: Vec<Event>,
}

impl CollectorStore {
    /// Open a session with a fresh random decimal id.
    fn open_session(&mut self, website_url: String) -> String {
        loop {
            let candidate = (uuid::Uuid::new_v4().as_u128() as u64 >> 1).to_string();
            if !self.sessions.contains_key(&candidate) {
                self.sessions.insert(
                    candidate.clone(),
                    SessionRecord::new(website_url, candidate.clone()),
                );
                return candidate;
            }
        }
    }

    /// Validate and record an event.
    fn accept(&mut self, event: Event) -> Result<(), String> {
        let record = self
            .sessions
            .get_mut(event.session_id())
            .filter(|record| record.website_url == event.website_url())
            .ok_or_else(|| "Unknown session".to_string())?;

        match &event {
            Event::WindowResize {
                resize_from,
                resize_to,
                ..
            } if !resize_from.is_complete() || !resize_to.is_complete() => {
                return Err("Incomplete dimensions".to_string());
            }
            _ => {}
        }

        record.apply(&event);
        self.events.push(event);
        Ok(())
    }
}

/// Shared collector state.
pub type SharedStore = Arc<RwLock<CollectorStore>>;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: impl Into<String>, code: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
        }),
    )
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /new_session, POST /new
async fn new_session(
    State(store): State<SharedStore>,
    body: String,
) -> Result<Json<NewSessionResponse>, ApiError> {
    let request: NewSessionRequest = serde_json::from_str(&body)
        .map_err(|_| bad_request("Malformed request body", "MALFORMED_BODY"))?;

    let url = request.website_url.trim();
    if url.is_empty() || !url.contains("://") {
        tracing::warn!("Rejected session for invalid URL '{}'", request.website_url);
        return Err(bad_request("Invalid URL", "INVALID_URL"));
    }

    let session_id = store.write().await.open_session(url.to_string());
    tracing::info!(session_id = %session_id, website_url = url, "session opened");

    Ok(Json(NewSessionResponse { session_id }))
}

async fn ingest(
    store: &SharedStore,
    body: &str,
    expected: Option<EventKind>,
) -> Result<StatusCode, ApiError> {
    let event: Event = serde_json::from_str(body)
        .map_err(|_| bad_request("Malformed request body", "MALFORMED_BODY"))?;

    if let Some(expected) = expected {
        if event.kind() != expected {
            return Err(bad_request(
                format!("Expected {expected} event, got {}", event.kind()),
                "WRONG_EVENT_TYPE",
            ));
        }
    }

    let kind = event.kind();
    store
        .write()
        .await
        .accept(event)
        .map_err(|e| bad_request(e, "INVALID_EVENT"))?;
    tracing::debug!(event_type = %kind, "event recorded");

    Ok(StatusCode::OK)
}

/// POST /new_resize_event
async fn resize_event(
    State(store): State<SharedStore>,
    body: String,
) -> Result<StatusCode, ApiError> {
    ingest(&store, &body, Some(EventKind::WindowResize)).await
}

/// POST /new_cp_event
async fn copy_paste_event(
    State(store): State<SharedStore>,
    body: String,
) -> Result<StatusCode, ApiError> {
    ingest(&store, &body, Some(EventKind::CopyAndPaste)).await
}

/// POST /new_time_taken_event
async fn time_taken_event(
    State(store): State<SharedStore>,
    body: String,
) -> Result<StatusCode, ApiError> {
    ingest(&store, &body, Some(EventKind::TimeTaken)).await
}

/// POST /new_event
async fn any_event(State(store): State<SharedStore>, body: String) -> Result<StatusCode, ApiError> {
    ingest(&store, &body, None).await
}

/// Build the collector router over `store`.
pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/new_session", post(new_session))
        .route("/new", post(new_session))
        .route("/new_resize_event", post(resize_event))
        .route("/new_cp_event", post(copy_paste_event))
        .route("/new_time_taken_event", post(time_taken_event))
        .route("/new_event", post(any_event))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(Any),
        )
        .with_state(store)
}

/// A collector running in the background.
pub struct RunningCollector {
    pub addr: SocketAddr,
    store: SharedStore,
    shutdown: tokio::sync::oneshot::Sender<()>,
}

impl RunningCollector {
    /// Base URL to configure clients with.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Every accepted event, in arrival order.
    pub async fn events(&self) -> Vec<Event> {
        self.store.read().await.events.clone()
    }

    /// The record for `session_id`, if the session exists.
    pub async fn session(&self, session_id: &str) -> Option<SessionRecord> {
        self.store.read().await.sessions.get(session_id).cloned()
    }

    /// Stop accepting connections.
    pub fn shutdown(self) {
        let _ = self.shutdown.send(());
    }
}

/// Run the collector
pub async fn run(config: ServerConfig) -> anyhow::Result<RunningCollector> {
    let store: SharedStore = Arc::new(RwLock::new(CollectorStore::default()));
    let app = router(store.clone());

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Collector listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Collector shutdown signal received");
            })
            .await
        {
            tracing::error!("Collector error: {}", e);
        }
    });

    Ok(RunningCollector {
        addr: actual_addr,
        store,
        shutdown: shutdown_tx,
    })
}
