//! Scripted interaction traces.
//!
//! A trace describes a page visit as a list of steps, each delayed relative
//! to the previous one:
//!
//! ```json
//! {
//!   "url": "https://shop.example/signup",
//!   "viewport": { "width": 800, "height": 600 },
//!   "steps": [
//!     { "afterMs": 100, "action": "keyUp", "inputId": "email" },
//!     { "afterMs": 50, "action": "paste", "inputId": "email" },
//!     { "afterMs": 20, "action": "resize", "width": 1024, "height": 768 },
//!     { "afterMs": 3000, "action": "submit" }
//!   ]
//! }
//! ```

use crate::core::Viewport;
use crate::page::types::PageSignal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// A recorded or hand-written page visit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionTrace {
    /// URL of the page
    pub url: String,
    /// Viewport when the page becomes ready
    pub viewport: Viewport,
    /// Steps, in order
    #[serde(default)]
    pub steps: Vec<TraceStep>,
}

/// One step of a trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceStep {
    /// Delay after the previous step
    #[serde(rename = "afterMs", default)]
    pub after_ms: u64,
    #[serde(flatten)]
    pub action: TraceAction,
}

/// What happens at a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum TraceAction {
    Resize {
        width: u32,
        height: u32,
    },
    Paste {
        #[serde(rename = "inputId", default)]
        input_id: String,
    },
    KeyUp {
        #[serde(rename = "inputId", default)]
        input_id: String,
    },
    Submit {
        #[serde(rename = "formId", default)]
        form_id: Option<String>,
    },
}

impl TraceAction {
    /// Turn the action into a signal stamped with the current time.
    pub fn to_signal(&self) -> PageSignal {
        match self {
            TraceAction::Resize { width, height } => {
                PageSignal::resize(Viewport::new(*width, *height))
            }
            TraceAction::Paste { input_id } => PageSignal::paste(input_id.clone()),
            TraceAction::KeyUp { input_id } => PageSignal::key_up(input_id.clone()),
            TraceAction::Submit { form_id } => PageSignal::submit(form_id.clone()),
        }
    }
}

impl InteractionTrace {
    /// Load a trace from a JSON file.
    pub fn load(path: &Path) -> Result<Self, TraceError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| TraceError::IoError(e.to_string()))?;
        Self::from_json(&content)
    }

    /// Parse a trace from JSON.
    pub fn from_json(json: &str) -> Result<Self, TraceError> {
        serde_json::from_str(json).map_err(|e| TraceError::ParseError(e.to_string()))
    }

    /// Total scripted duration.
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.steps.iter().map(|s| s.after_ms).sum())
    }

    /// Play the trace in real time, sending each step to `signals`.
    ///
    /// Stops early if the receiving side has gone away. Returns the number of
    /// signals delivered.
    pub async fn play(&self, signals: UnboundedSender<PageSignal>) -> usize {
        let mut delivered = 0;
        for step in &self.steps {
            if step.after_ms > 0 {
                tokio::time::sleep(Duration::from_millis(step.after_ms)).await;
            }
            if signals.send(step.action.to_signal()).is_err() {
                tracing::debug!(delivered, "page runtime stopped listening, ending trace");
                break;
            }
            delivered += 1;
        }
        delivered
    }
}

/// Trace loading errors.
#[derive(Debug)]
pub enum TraceError {
    IoError(String),
    ParseError(String),
}

impl std::fmt::Display for TraceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TraceError::IoError(e) => write!(f, "IO error: {e}"),
            TraceError::ParseError(e) => write!(f, "Parse error: {e}"),
        }
    }
}

impl std::error::Error for TraceError {}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = r#"{
        "url": "https://shop.example/signup",
        "viewport": { "width": 800, "height": 600 },
        "steps": [
            { "afterMs": 10, "action": "keyUp", "inputId": "email" },
            { "afterMs": 5, "action": "paste", "inputId": "email" },
            { "afterMs": 5, "action": "resize", "width": 1024, "height": 768 },
            { "afterMs": 5, "action": "submit", "formId": "signup" }
        ]
    }"#;

    #[test]
    fn test_parse_trace() {
        let trace = InteractionTrace::from_json(TRACE).unwrap();
        assert_eq!(trace.viewport, Viewport::new(800, 600));
        assert_eq!(trace.steps.len(), 4);
        assert_eq!(
            trace.steps[2].action,
            TraceAction::Resize {
                width: 1024,
                height: 768
            }
        );
        assert_eq!(trace.duration(), Duration::from_millis(25));
    }

    #[test]
    fn test_submit_without_form_id() {
        let trace = InteractionTrace::from_json(
            r#"{"url":"https://a.example","viewport":{"width":1,"height":1},
                "steps":[{"action":"submit"}]}"#,
        )
        .unwrap();
        assert_eq!(trace.steps[0].after_ms, 0);
        assert_eq!(trace.steps[0].action, TraceAction::Submit { form_id: None });
    }

    #[test]
    fn test_rejects_unknown_action() {
        let result = InteractionTrace::from_json(
            r#"{"url":"https://a.example","viewport":{"width":1,"height":1},
                "steps":[{"action":"scroll"}]}"#,
        );
        assert!(matches!(result, Err(TraceError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_play_delivers_signals_in_order() {
        let trace = InteractionTrace::from_json(TRACE).unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let delivered = trace.play(tx).await;
        assert_eq!(delivered, 4);

        let mut names = Vec::new();
        while let Some(signal) = rx.recv().await {
            names.push(signal.name());
        }
        assert_eq!(names, vec!["keyup", "paste", "resize", "submit"]);
    }

    #[tokio::test]
    async fn test_play_stops_when_receiver_dropped() {
        let trace = InteractionTrace::from_json(TRACE).unwrap();
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        assert_eq!(trace.play(tx).await, 0);
    }
}
