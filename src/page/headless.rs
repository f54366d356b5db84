//! In-memory page host.
//!
//! Used by the `replay` command and by tests, where there is no browser
//! behind the pipeline.

use crate::core::Viewport;
use crate::page::host::PageHost;
use std::collections::HashMap;

/// A page with a fixed URL, an in-memory cookie jar, and a record of
/// programmatic form submissions.
#[derive(Debug, Clone)]
pub struct HeadlessPage {
    location: String,
    viewport: Viewport,
    cookies: HashMap<String, String>,
    cookie_writes: usize,
    resubmissions: Vec<Option<String>>,
}

impl HeadlessPage {
    /// Create a page at `location` with the given initial viewport.
    pub fn new(location: impl Into<String>, viewport: Viewport) -> Self {
        Self {
            location: location.into(),
            viewport,
            cookies: HashMap::new(),
            cookie_writes: 0,
            resubmissions: Vec::new(),
        }
    }

    /// Number of cookie writes since the page was created.
    pub fn cookie_writes(&self) -> usize {
        self.cookie_writes
    }

    /// Forms submitted through [`PageHost::resubmit_form`], in order.
    pub fn resubmissions(&self) -> &[Option<String>] {
        &self.resubmissions
    }
}

impl PageHost for HeadlessPage {
    fn location(&self) -> String {
        self.location.clone()
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
        self.cookie_writes += 1;
    }

    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }

    fn resubmit_form(&mut self, form_id: Option<&str>) {
        self.resubmissions.push(form_id.map(str::to_string));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_jar() {
        let mut page = HeadlessPage::new("https://a.example", Viewport::new(800, 600));
        assert_eq!(page.cookie("session_id"), None);

        page.set_cookie("session_id", "abc123");
        assert_eq!(page.cookie("session_id").as_deref(), Some("abc123"));
        assert_eq!(page.cookie_writes(), 1);
    }

    #[test]
    fn test_viewport_and_resubmissions() {
        let mut page = HeadlessPage::new("https://a.example", Viewport::new(800, 600));
        assert_eq!(page.viewport(), Viewport::new(800, 600));

        page.resubmit_form(Some("signup"));
        page.resubmit_form(None);
        assert_eq!(
            page.resubmissions(),
            &[Some("signup".to_string()), None]
        );
    }
}
