//! Application state shared across HTTP handlers

use crate::core::probe::{CustomHook, SettingsSource};
use crate::utils::logging::{Logger, TracingLogger};
use std::sync::Arc;

/// HTTP server state shared across handlers.
///
/// Each request runs its own full check; the state only carries the wiring
/// that is identical for every invocation.
#[derive(Clone)]
pub struct AppState {
    /// Where each invocation's bootstrap loads settings from.
    pub source: SettingsSource,
    /// Sink for warning/error/slow log items.
    pub logger: Arc<dyn Logger>,
    /// Optional host-provided extension hook; overrides any script
    /// configured in settings.
    pub hook: Option<Arc<dyn CustomHook>>,
}

impl AppState {
    /// Create state with the default tracing-backed logger.
    pub fn new(source: SettingsSource) -> Self {
        Self {
            source,
            logger: Arc::new(TracingLogger),
            hook: None,
        }
    }

    /// Replace the logging sink.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Wire a custom extension hook.
    pub fn with_hook(mut self, hook: Arc<dyn CustomHook>) -> Self {
        self.hook = Some(hook);
        self
    }
}
