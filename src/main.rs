//! Page Telemetry CLI
//!
//! Replays scripted page visits through the telemetry pipeline and, with the
//! `server` feature, runs a reference collector.

use clap::{Parser, Subcommand};
use page_telemetry::{
    config::{Config, EndpointLayout, SessionIdSource},
    page::{HeadlessPage, InteractionTrace, PageHost},
    runtime::PageRuntime,
    transparency::create_shared_log,
    PRIVACY_DECLARATION, VERSION,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "page-telemetry")]
#[command(version = VERSION)]
#[command(about = "Session-scoped capture of resize, paste and time-to-submit signals", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scripted page visit against a collector
    Replay {
        /// Trace file (JSON)
        trace: PathBuf,

        /// Collector base URL (overrides the configuration file)
        #[arg(long)]
        collector: Option<String>,

        /// Use the unified `/new` + `/new_event` endpoints
        #[arg(long)]
        unified: bool,

        /// Generate the session id locally instead of using the collector's
        #[arg(long)]
        local_session: bool,

        /// Resize debounce in milliseconds
        #[arg(long)]
        debounce_ms: Option<u64>,

        /// How long the page stays open after the last step, in milliseconds
        #[arg(long, default_value = "1500")]
        linger_ms: u64,
    },

    /// Run the reference collector (requires the server feature)
    #[cfg(feature = "server")]
    Collector {
        /// Port to listen on
        #[arg(long, default_value = "5000")]
        port: u16,
    },

    /// Display privacy declaration
    Privacy,

    /// Show configuration
    Config {
        /// Write the default configuration if none exists
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("page_telemetry=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            trace,
            collector,
            unified,
            local_session,
            debounce_ms,
            linger_ms,
        } => {
            cmd_replay(
                &trace,
                collector,
                unified,
                local_session,
                debounce_ms,
                linger_ms,
            );
        }
        #[cfg(feature = "server")]
        Commands::Collector { port } => {
            cmd_collector(port);
        }
        Commands::Privacy => {
            cmd_privacy();
        }
        Commands::Config { init } => {
            cmd_config(init);
        }
    }
}

fn cmd_replay(
    trace_path: &Path,
    collector: Option<String>,
    unified: bool,
    local_session: bool,
    debounce_ms: Option<u64>,
    linger_ms: u64,
) {
    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load configuration, using defaults: {e}");
            Config::default()
        }
    };
    if let Some(url) = collector {
        config.collector_url = url;
    }
    if unified {
        config.endpoints = EndpointLayout::Unified;
    }
    if local_session {
        config.session_id_source = SessionIdSource::Local;
    }
    if let Some(ms) = debounce_ms {
        config.resize_debounce = Duration::from_millis(ms);
    }
    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let trace = match InteractionTrace::load(trace_path) {
        Ok(trace) => trace,
        Err(e) => {
            eprintln!("Error loading trace {trace_path:?}: {e}");
            std::process::exit(1);
        }
    };

    println!("Page Telemetry v{VERSION}");
    println!();
    println!(
        "Replaying {} steps ({:.1}s) on {}",
        trace.steps.len(),
        trace.duration().as_secs_f64(),
        trace.url
    );
    println!("  Collector: {}", config.collector_url);
    println!("  Endpoints: {:?}", config.endpoints);
    println!("  Session id: {:?}", config.session_id_source);
    println!("  Resize debounce: {}ms", config.resize_debounce.as_millis());
    println!();

    let cookie_name = config.cookie_name.clone();
    let log = create_shared_log();
    let page = HeadlessPage::new(trace.url.clone(), trace.viewport);
    let runtime = PageRuntime::new(config, page).with_log(log.clone());

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error creating runtime: {e}");
            std::process::exit(1);
        }
    };

    let outcome = rt.block_on(async {
        let (signals, receiver) = tokio::sync::mpsc::unbounded_channel();

        let visitor = async move {
            tokio::select! {
                delivered = trace.play(signals.clone()) => {
                    tokio::time::sleep(Duration::from_millis(linger_ms)).await;
                    delivered
                }
                _ = wait_until_stopped(running) => {
                    println!("Interrupted, unloading page...");
                    0
                }
            }
            // `signals` drops here: the page unloads.
        };

        let (outcome, delivered) = tokio::join!(runtime.run(receiver), visitor);
        tracing::debug!(delivered, "trace finished");
        outcome
    });

    println!();
    match &outcome.session {
        Some(session) => {
            println!("Session: {}", session.id());
            println!(
                "Cookie {}: {}",
                cookie_name,
                outcome.host.cookie(&cookie_name).unwrap_or_default()
            );
            println!(
                "Form re-submissions: {}",
                outcome.host.resubmissions().len()
            );
        }
        None => {
            eprintln!("Session could not be established; nothing was observed.");
        }
    }

    println!();
    println!("{}", log.summary());

    if outcome.session.is_none() {
        std::process::exit(1);
    }
}

#[cfg(feature = "server")]
fn cmd_collector(port: u16) {
    use page_telemetry::server::{run, ServerConfig};

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error creating runtime: {e}");
            std::process::exit(1);
        }
    };

    let collector = match rt.block_on(run(ServerConfig::new(port))) {
        Ok(collector) => collector,
        Err(e) => {
            eprintln!("Error starting collector: {e}");
            std::process::exit(1);
        }
    };

    println!("Reference collector listening on {}", collector.url());
    println!("Press Ctrl+C to stop");

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }

    let events = rt.block_on(collector.events());
    println!();
    println!("Stopping collector ({} events recorded)", events.len());
    collector.shutdown();
}

fn cmd_privacy() {
    println!("{PRIVACY_DECLARATION}");
}

fn cmd_config(init: bool) {
    let path = Config::config_path();

    if init && !path.exists() {
        if let Err(e) = Config::default().save() {
            eprintln!("Error saving config: {e}");
            std::process::exit(1);
        }
        println!("Wrote default configuration.");
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            std::process::exit(1);
        }
    };

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {path:?}");
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    }) {
        eprintln!("Warning: Could not set Ctrl+C handler: {e}");
    }
}

async fn wait_until_stopped(running: Arc<AtomicBool>) {
    while running.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
