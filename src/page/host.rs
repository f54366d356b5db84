//! The seam between the telemetry pipeline and the page it is embedded in.

use crate::core::Viewport;

/// What the pipeline needs from the embedding page.
pub trait PageHost {
    /// Full URL of the current page.
    fn location(&self) -> String;

    /// Current viewport size.
    fn viewport(&self) -> Viewport;

    /// Write a cookie (or equivalent durable per-page value).
    fn set_cookie(&mut self, name: &str, value: &str);

    /// Read a cookie back.
    fn cookie(&self, name: &str) -> Option<String>;

    /// Submit the form programmatically after an intercepted submission.
    fn resubmit_form(&mut self, form_id: Option<&str>);
}
