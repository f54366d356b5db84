//! Core data model for page telemetry.
//!
//! This module contains:
//! - The session identity every event is bound to
//! - The closed set of event records sent to the collector

pub mod events;
pub mod session;

// Re-export commonly used types
pub use events::{Dimension, Event, EventKind, Viewport};
pub use session::{local_session_id, SessionContext, SessionError, SharedSession};
