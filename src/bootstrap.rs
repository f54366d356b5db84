//! Session bootstrap: the single request that opens a telemetry session.

use crate::config::{Config, SessionIdSource};
use crate::core::{local_session_id, SessionContext};
use crate::page::PageHost;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of the session-creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSessionRequest {
    #[serde(rename = "websiteURL")]
    pub website_url: String,
}

/// Body of the session-creation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSessionResponse {
    #[serde(rename = "sessionID")]
    pub session_id: String,
}

/// Bootstrap error types.
#[derive(Debug)]
pub enum BootstrapError {
    /// Network/HTTP error
    Network(String),
    /// Collector returned an error response
    Server { status: u16, message: String },
    /// Response body was not a session response
    Malformed(String),
    /// Collector answered with an empty session id
    EmptySessionId,
}

impl std::fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BootstrapError::Network(msg) => write!(f, "Session request failed: {msg}"),
            BootstrapError::Server { status, message } => {
                write!(f, "Session request rejected ({status}): {message}")
            }
            BootstrapError::Malformed(msg) => write!(f, "Malformed session response: {msg}"),
            BootstrapError::EmptySessionId => write!(f, "Collector issued an empty session id"),
        }
    }
}

impl std::error::Error for BootstrapError {}

impl BootstrapError {
    /// HTTP status, when the collector answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            BootstrapError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Opens the session for one page visit.
pub struct SessionBootstrap {
    client: reqwest::Client,
    config: Arc<Config>,
}

impl SessionBootstrap {
    pub fn new(client: reqwest::Client, config: Arc<Config>) -> Self {
        Self { client, config }
    }

    /// Request a session for the page, then persist its id in the page's
    /// cookie store.
    ///
    /// Issues exactly one request and writes the cookie at most once. On
    /// error nothing is written and nothing is retried.
    pub async fn establish<H: PageHost>(
        &self,
        host: &mut H,
    ) -> Result<Arc<SessionContext>, BootstrapError> {
        let website_url = host.location();
        let session_id = self.request_session(&website_url).await?;

        let session =
            SessionContext::new(session_id, website_url).map_err(|_| BootstrapError::EmptySessionId)?;
        host.set_cookie(&self.config.cookie_name, session.id());

        tracing::info!(
            session_id = session.id(),
            website_url = session.website_url(),
            "telemetry session established"
        );

        Ok(Arc::new(session))
    }

    async fn request_session(&self, website_url: &str) -> Result<String, BootstrapError> {
        let response = self
            .client
            .post(self.config.session_url())
            .header("Content-Type", "application/json")
            .json(&NewSessionRequest {
                website_url: website_url.to_string(),
            })
            .send()
            .await
            .map_err(|e| BootstrapError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BootstrapError::Server {
                status: status.as_u16(),
                message,
            });
        }

        match self.config.session_id_source {
            SessionIdSource::Local => Ok(local_session_id()),
            SessionIdSource::Server => {
                let body: NewSessionResponse = response
                    .json()
                    .await
                    .map_err(|e| BootstrapError::Malformed(e.to_string()))?;
                Ok(body.session_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let body = serde_json::to_value(NewSessionRequest {
            website_url: "https://a.example/form".to_string(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"websiteURL": "https://a.example/form"}));

        let response: NewSessionResponse =
            serde_json::from_str(r#"{"sessionID":"abc123"}"#).unwrap();
        assert_eq!(response.session_id, "abc123");
    }

    #[test]
    fn test_error_status() {
        let err = BootstrapError::Server {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.status(), Some(500));
        assert_eq!(BootstrapError::Network("refused".to_string()).status(), None);
        assert!(err.to_string().contains("500"));
    }
}
