//! Logging side channel for check results
//!
//! Every `warning` and `error` entry, plus every slow probe duration, is
//! emitted as one line through the injected [`Logger`] capability. The core
//! does not care which concrete sink is used; the binaries pick one.

use parking_lot::Mutex;

/// Sink for per-item check logging.
///
/// One line per item, format `ping: <category>: <name>: <message>`.
pub trait Logger: Send + Sync {
    /// Emit one log line for a check result item.
    fn log(&self, category: &str, name: &str, message: &str);
}

/// Production sink backed by `tracing`.
///
/// `error`-category items map to `tracing::error!`, everything else
/// (`warning`, `slow`) to `tracing::warn!`.
#[derive(Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, category: &str, name: &str, message: &str) {
        if category == "error" {
            tracing::error!(category, check = name, "ping: {}: {}: {}", category, name, message);
        } else {
            tracing::warn!(category, check = name, "ping: {}: {}: {}", category, name, message);
        }
    }
}

/// Buffering sink for tests: collects formatted lines in memory.
#[derive(Debug, Default)]
pub struct BufferLogger {
    lines: Mutex<Vec<String>>,
}

impl BufferLogger {
    /// Create an empty buffer sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the collected lines.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl Logger for BufferLogger {
    fn log(&self, category: &str, name: &str, message: &str) {
        self.lines
            .lock()
            .push(format!("ping: {category}: {name}: {message}"));
    }
}

/// Initialize the tracing subscriber for the binaries.
///
/// `PING_LOG_FORMAT=json` selects JSON output for structured-log
/// environments; anything else gets the plain formatter. Both write to
/// stderr so the response body stays clean on the CLI.
pub fn init_tracing() {
    let json = std::env::var("PING_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
