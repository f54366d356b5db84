//! Wire-level event records sent to the collector.
//!
//! Every event is built from a [`SessionContext`], so a record without a
//! session identifier cannot be constructed.

use crate::core::session::SessionContext;
use serde::{Deserialize, Serialize};

/// Viewport size as reported by the host page, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Viewport dimensions as they travel on the wire (decimal strings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub width: String,
    pub height: String,
}

impl Dimension {
    /// Both sides present.
    pub fn is_complete(&self) -> bool {
        !self.width.is_empty() && !self.height.is_empty()
    }
}

impl From<Viewport> for Dimension {
    fn from(viewport: Viewport) -> Self {
        Self {
            width: viewport.width.to_string(),
            height: viewport.height.to_string(),
        }
    }
}

/// Kind of an [`Event`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    WindowResize,
    CopyAndPaste,
    TimeTaken,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        EventKind::WindowResize,
        EventKind::CopyAndPaste,
        EventKind::TimeTaken,
    ];

    /// Name used in the `eventType` tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::WindowResize => "windowResize",
            EventKind::CopyAndPaste => "copyAndPaste",
            EventKind::TimeTaken => "timeTaken",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A captured interaction, tagged by `eventType` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "eventType")]
pub enum Event {
    #[serde(rename = "windowResize")]
    WindowResize {
        #[serde(rename = "websiteURL")]
        website_url: String,
        #[serde(rename = "sessionID")]
        session_id: String,
        #[serde(rename = "resizeFrom")]
        resize_from: Dimension,
        #[serde(rename = "resizeTo")]
        resize_to: Dimension,
    },
    #[serde(rename = "copyAndPaste")]
    CopyAndPaste {
        #[serde(rename = "websiteURL")]
        website_url: String,
        #[serde(rename = "sessionID")]
        session_id: String,
        #[serde(rename = "inputID")]
        input_id: String,
    },
    #[serde(rename = "timeTaken")]
    TimeTaken {
        #[serde(rename = "websiteURL")]
        website_url: String,
        #[serde(rename = "sessionID")]
        session_id: String,
        #[serde(rename = "timeSeconds")]
        time_seconds: u64,
    },
}

impl Event {
    /// First settled resize of the page.
    pub fn window_resize(session: &SessionContext, from: Viewport, to: Viewport) -> Self {
        Event::WindowResize {
            website_url: session.website_url().to_string(),
            session_id: session.id().to_string(),
            resize_from: from.into(),
            resize_to: to.into(),
        }
    }

    /// First paste into the given input.
    pub fn copy_and_paste(session: &SessionContext, input_id: impl Into<String>) -> Self {
        Event::CopyAndPaste {
            website_url: session.website_url().to_string(),
            session_id: session.id().to_string(),
            input_id: input_id.into(),
        }
    }

    /// Whole seconds between the first keystroke and form submission.
    pub fn time_taken(session: &SessionContext, time_seconds: u64) -> Self {
        Event::TimeTaken {
            website_url: session.website_url().to_string(),
            session_id: session.id().to_string(),
            time_seconds,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Event::WindowResize { .. } => EventKind::WindowResize,
            Event::CopyAndPaste { .. } => EventKind::CopyAndPaste,
            Event::TimeTaken { .. } => EventKind::TimeTaken,
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            Event::WindowResize { session_id, .. }
            | Event::CopyAndPaste { session_id, .. }
            | Event::TimeTaken { session_id, .. } => session_id,
        }
    }

    pub fn website_url(&self) -> &str {
        match self {
            Event::WindowResize { website_url, .. }
            | Event::CopyAndPaste { website_url, .. }
            | Event::TimeTaken { website_url, .. } => website_url,
        }
    }
}
