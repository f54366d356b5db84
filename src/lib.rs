//! Page Telemetry - session-scoped interaction capture for web pages.
//!
//! Once a page is ready, this library opens a session with a remote
//! collector and reports three signals, each correlated to the session and
//! the page URL:
//!
//! - the first settled viewport resize
//! - the first paste into each input
//! - the time from the first keystroke to form submission
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        PageRuntime                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌──────────────┐   ┌─────────────────┐   │
//! │  │  Bootstrap  │──▶│   Watchers   │──▶│ EventDispatcher │──▶ collector
//! │  │ (1 request) │   │ resize/paste │   │  (JSON POST)    │   │
//! │  └─────────────┘   │ submit timer │   └─────────────────┘   │
//! │         │          └──────────────┘            │            │
//! │         ▼                 ▲                    ▼            │
//! │  ┌─────────────┐          │            ┌──────────────┐     │
//! │  │ session     │     PageSignal        │ Transparency │     │
//! │  │ cookie      │     (host page)       │     Log      │     │
//! │  └─────────────┘                       └──────────────┘     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Delivery is best effort: nothing is retried or buffered, and any
//! interaction that happens before the session exists is not observed.
//!
//! # Example
//!
//! ```no_run
//! use page_telemetry::{Config, HeadlessPage, PageRuntime, PageSignal, Viewport};
//!
//! # async fn visit() {
//! let page = HeadlessPage::new("https://shop.example/signup", Viewport::new(800, 600));
//! let runtime = PageRuntime::new(Config::default(), page);
//!
//! let (signals, receiver) = tokio::sync::mpsc::unbounded_channel();
//! let visit = tokio::spawn(runtime.run(receiver));
//!
//! signals.send(PageSignal::paste("email")).ok();
//! drop(signals); // page unload
//!
//! let outcome = visit.await.expect("runtime panicked");
//! println!("{:?}", outcome.stats);
//! # }
//! ```

pub mod bootstrap;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod page;
pub mod runtime;
pub mod transparency;
pub mod watchers;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use bootstrap::{BootstrapError, SessionBootstrap};
pub use config::{Config, ConfigError, EndpointLayout, SessionIdSource};
pub use crate::core::{Dimension, Event, EventKind, SessionContext, SharedSession, Viewport};
pub use dispatch::{DispatchError, EventDispatcher};
pub use page::{HeadlessPage, InteractionTrace, PageHost, PageSignal};
pub use runtime::{PageRuntime, RunOutcome};
pub use transparency::{SharedTransparencyLog, TransparencyLog, TransparencyStats};
pub use watchers::{PasteTracker, PasteWatcher, ResizeWatcher, SubmitTimer};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Declaration of what is collected, for display to site operators and visitors.
pub const PRIVACY_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║              PAGE TELEMETRY - PRIVACY DECLARATION                ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This script reports how a form is filled in, per page visit.    ║
║                                                                  ║
║  ✓ WHAT WE CAPTURE:                                              ║
║    • The page URL and a per-visit session id                     ║
║    • Window size before and after the first resize               ║
║    • The id of each input something was pasted into              ║
║    • Seconds from the first keystroke to form submission         ║
║                                                                  ║
║  ✗ WHAT WE NEVER CAPTURE:                                        ║
║    • What you type or paste (no passwords, card numbers, etc.)   ║
║    • Which keys you press                                        ║
║    • Where your cursor is                                        ║
║    • Anything before the session is established                  ║
║                                                                  ║
║  Each signal is sent at most once per visit (paste: once per     ║
║  input). Nothing is stored in the browser beyond the session id. ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
