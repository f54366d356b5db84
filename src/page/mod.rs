//! The host page the pipeline is embedded in.
//!
//! This module defines the signals a page delivers, the [`PageHost`] seam
//! the pipeline calls back into, an in-memory host, and scripted traces that
//! drive it.

pub mod headless;
pub mod host;
pub mod trace;
pub mod types;

// Re-export commonly used types
pub use headless::HeadlessPage;
pub use host::PageHost;
pub use trace::{InteractionTrace, TraceAction, TraceError, TraceStep};
pub use types::PageSignal;
