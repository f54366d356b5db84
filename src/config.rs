//! Configuration for page telemetry.

use crate::core::EventKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default collector address.
pub const DEFAULT_COLLECTOR_URL: &str = "http://localhost:5000";

/// Default name of the cookie holding the session id.
pub const DEFAULT_COOKIE_NAME: &str = "session_id";

/// Quiet period after the last resize before the resize is reported.
pub const DEFAULT_RESIZE_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the collector (scheme, host and port)
    pub collector_url: String,

    /// How endpoints are laid out on the collector
    pub endpoints: EndpointLayout,

    /// Where the session id comes from
    pub session_id_source: SessionIdSource,

    /// Debounce window for the first resize
    #[serde(with = "duration_ms_serde")]
    pub resize_debounce: Duration,

    /// Cookie the session id is written to
    pub cookie_name: String,

    /// Timeout for every request to the collector
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collector_url: DEFAULT_COLLECTOR_URL.to_string(),
            endpoints: EndpointLayout::default(),
            session_id_source: SessionIdSource::default(),
            resize_debounce: DEFAULT_RESIZE_DEBOUNCE,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if it is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("page-telemetry")
            .join("config.json")
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.collector_url.contains("://") {
            return Err(ConfigError::Invalid(format!(
                "collector_url '{}' has no scheme",
                self.collector_url
            )));
        }
        if self.cookie_name.trim().is_empty() {
            return Err(ConfigError::Invalid("cookie_name is empty".to_string()));
        }
        Ok(())
    }

    fn base_url(&self) -> &str {
        self.collector_url.trim_end_matches('/')
    }

    /// Full URL of the session-creation endpoint.
    pub fn session_url(&self) -> String {
        format!("{}{}", self.base_url(), self.endpoints.session_path())
    }

    /// Full URL events of `kind` are posted to.
    pub fn event_url(&self, kind: EventKind) -> String {
        format!("{}{}", self.base_url(), self.endpoints.event_path(kind))
    }
}

/// Collector endpoint layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointLayout {
    /// `/new_session` plus one endpoint per event kind
    #[default]
    PerEvent,
    /// `/new` plus a single `/new_event`
    Unified,
}

impl EndpointLayout {
    pub fn session_path(&self) -> &'static str {
        match self {
            EndpointLayout::PerEvent => "/new_session",
            EndpointLayout::Unified => "/new",
        }
    }

    pub fn event_path(&self, kind: EventKind) -> &'static str {
        match (self, kind) {
            (EndpointLayout::Unified, _) => "/new_event",
            (EndpointLayout::PerEvent, EventKind::WindowResize) => "/new_resize_event",
            (EndpointLayout::PerEvent, EventKind::CopyAndPaste) => "/new_cp_event",
            (EndpointLayout::PerEvent, EventKind::TimeTaken) => "/new_time_taken_event",
        }
    }
}

/// Source of the session identifier once session creation succeeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionIdSource {
    /// Use `sessionID` from the collector response
    #[default]
    Server,
    /// Generate a random id locally and ignore the response body
    Local,
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration in whole seconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Serde support for Duration in milliseconds.
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.resize_debounce, Duration::from_millis(1000));
        assert_eq!(config.cookie_name, "session_id");
        assert_eq!(config.endpoints, EndpointLayout::PerEvent);
        assert_eq!(config.session_id_source, SessionIdSource::Server);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_per_event_urls() {
        let config = Config {
            collector_url: "http://127.0.0.1:5000/".to_string(),
            ..Config::default()
        };
        assert_eq!(config.session_url(), "http://127.0.0.1:5000/new_session");
        assert_eq!(
            config.event_url(EventKind::WindowResize),
            "http://127.0.0.1:5000/new_resize_event"
        );
        assert_eq!(
            config.event_url(EventKind::CopyAndPaste),
            "http://127.0.0.1:5000/new_cp_event"
        );
        assert_eq!(
            config.event_url(EventKind::TimeTaken),
            "http://127.0.0.1:5000/new_time_taken_event"
        );
    }

    #[test]
    fn test_unified_urls() {
        let config = Config {
            endpoints: EndpointLayout::Unified,
            ..Config::default()
        };
        assert_eq!(config.session_url(), "http://localhost:5000/new");
        for kind in EventKind::ALL {
            assert_eq!(config.event_url(kind), "http://localhost:5000/new_event");
        }
    }

    #[test]
    fn test_validation() {
        let config = Config {
            collector_url: "localhost:5000".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = Config {
            cookie_name: " ".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip_on_disk() {
        let path = std::env::temp_dir()
            .join(format!("page-telemetry-config-{}", uuid::Uuid::new_v4()))
            .join("config.json");

        let config = Config {
            endpoints: EndpointLayout::Unified,
            session_id_source: SessionIdSource::Local,
            resize_debounce: Duration::from_millis(250),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"resize_debounce\": 250"));
        assert!(raw.contains("\"unified\""));

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.endpoints, EndpointLayout::Unified);
        assert_eq!(loaded.session_id_source, SessionIdSource::Local);
        assert_eq!(loaded.resize_debounce, Duration::from_millis(250));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("page-telemetry-does-not-exist.json");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.collector_url, DEFAULT_COLLECTOR_URL);
    }
}
