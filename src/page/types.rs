//! Interaction signals delivered by the host page.
//!
//! Signals carry only what the watchers need: viewport sizes and input
//! identifiers. Key codes and pasted content never reach this crate.

use crate::core::Viewport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One interaction observed by the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PageSignal {
    /// The window was resized to `viewport`
    Resize {
        viewport: Viewport,
        at: DateTime<Utc>,
    },
    /// Something was pasted into the input identified by `input_id`
    Paste {
        input_id: String,
        at: DateTime<Utc>,
    },
    /// A key was released inside an input
    KeyUp {
        input_id: String,
        at: DateTime<Utc>,
    },
    /// The form was submitted
    Submit {
        form_id: Option<String>,
        at: DateTime<Utc>,
    },
}

impl PageSignal {
    pub fn resize(viewport: Viewport) -> Self {
        PageSignal::Resize {
            viewport,
            at: Utc::now(),
        }
    }

    pub fn paste(input_id: impl Into<String>) -> Self {
        PageSignal::Paste {
            input_id: input_id.into(),
            at: Utc::now(),
        }
    }

    pub fn key_up(input_id: impl Into<String>) -> Self {
        PageSignal::KeyUp {
            input_id: input_id.into(),
            at: Utc::now(),
        }
    }

    pub fn submit(form_id: Option<String>) -> Self {
        PageSignal::Submit {
            form_id,
            at: Utc::now(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            PageSignal::Resize { at, .. }
            | PageSignal::Paste { at, .. }
            | PageSignal::KeyUp { at, .. }
            | PageSignal::Submit { at, .. } => *at,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            PageSignal::Resize { .. } => "resize",
            PageSignal::Paste { .. } => "paste",
            PageSignal::KeyUp { .. } => "keyup",
            PageSignal::Submit { .. } => "submit",
        }
    }
}
