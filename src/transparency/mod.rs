//! Transparency module.
//!
//! Tracks what the pipeline observed and what it sent, so a visit can be
//! audited without storing anything that identifies the visitor.

pub mod log;

// Re-export commonly used types
pub use log::{create_shared_log, SharedTransparencyLog, TransparencyLog, TransparencyStats};
