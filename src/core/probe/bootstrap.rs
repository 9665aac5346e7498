//! Bootstrap probe
//!
//! Initializes the application context: loads settings and opens the
//! database connection. Runs first; every later probe reads its outputs
//! from the context. A failure here is unrecoverable for the run as a
//! whole, but it still reports as a regular `error` outcome so the client
//! gets a diagnosable 500 instead of a hang.

use super::{Probe, ProbeContext};
use crate::config::Settings;
use crate::core::outcome::Outcome;
use crate::utils::error::Result;
use async_trait::async_trait;
use sea_orm::{ConnectOptions, Database};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Where the bootstrap probe gets its settings from.
#[derive(Debug, Clone)]
pub enum SettingsSource {
    /// Load from the config file / environment overlay.
    Load {
        /// Explicit config file path; falls back to `PING_CONFIG` and then
        /// `config/ping.yaml` when absent.
        config_path: Option<PathBuf>,
    },
    /// Use pre-built settings (tests, embedded wiring).
    Fixed(Arc<Settings>),
}

/// The bootstrap check: settings plus database layer initialization.
pub struct BootstrapProbe {
    source: SettingsSource,
}

impl BootstrapProbe {
    /// Create a bootstrap probe over the given settings source.
    pub fn new(source: SettingsSource) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Probe for BootstrapProbe {
    fn name(&self) -> &'static str {
        "bootstrap"
    }

    async fn run(&self, ctx: &mut ProbeContext) -> Result<Outcome> {
        let settings = match &self.source {
            SettingsSource::Load { config_path } => {
                Arc::new(Settings::load(config_path.as_deref())?)
            }
            SettingsSource::Fixed(settings) => settings.clone(),
        };

        // Expose settings before attempting the database connection so that
        // later probes can still read configuration when the database is
        // down.
        ctx.settings = Some(settings.clone());

        if let Some(url) = &settings.database.url {
            let mut options = ConnectOptions::new(url.clone());
            options
                .connect_timeout(CONNECT_TIMEOUT)
                .max_connections(1);
            ctx.db = Some(Database::connect(options).await?);
        }

        Ok(Outcome::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::outcome::Severity;
    use crate::core::probe::run_guarded;

    #[tokio::test]
    async fn test_fixed_settings_without_database() {
        let settings = Arc::new(Settings::default());
        let probe = BootstrapProbe::new(SettingsSource::Fixed(settings));
        let mut ctx = ProbeContext::default();

        let outcome = run_guarded(&probe, &mut ctx).await;
        assert_eq!(outcome.severity(), Severity::Success);
        assert!(ctx.settings.is_some());
        assert!(ctx.db.is_none());
    }

    #[tokio::test]
    async fn test_in_memory_database_connects() {
        let mut settings = Settings::default();
        settings.database.url = Some("sqlite::memory:".to_string());
        let probe = BootstrapProbe::new(SettingsSource::Fixed(Arc::new(settings)));
        let mut ctx = ProbeContext::default();

        let outcome = run_guarded(&probe, &mut ctx).await;
        assert_eq!(outcome.severity(), Severity::Success);
        assert!(ctx.db.is_some());
    }

    #[tokio::test]
    async fn test_unreachable_database_is_an_error() {
        let mut settings = Settings::default();
        settings.database.url = Some("sqlite:///nonexistent-dir/ping.db".to_string());
        let probe = BootstrapProbe::new(SettingsSource::Fixed(Arc::new(settings)));
        let mut ctx = ProbeContext::default();

        let outcome = run_guarded(&probe, &mut ctx).await;
        assert_eq!(outcome.severity(), Severity::Error);
        // Settings stay available for the rest of the run.
        assert!(ctx.settings.is_some());
        assert!(ctx.db.is_none());
    }
}
