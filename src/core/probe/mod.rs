//! Probe contract and safety boundary
//!
//! A probe is one independent dependency check. Probes run in a fixed order
//! under the runner; each produces exactly one [`Outcome`] and nothing a
//! probe does can escape [`run_guarded`]: `Err` returns and panics both
//! become `error` outcomes so one broken dependency never prevents the
//! remaining probes from running and reporting.

mod bootstrap;
mod custom;
mod database;
mod elasticsearch;
mod fs;
mod memcache;
mod redis;

pub use bootstrap::{BootstrapProbe, SettingsSource};
pub use custom::{CustomHook, CustomProbe, HookReport, ScriptHook};
pub use database::DbProbe;
pub use elasticsearch::ElasticsearchProbe;
pub use fs::{FsCleanupProbe, FsCreateProbe, FsDeleteProbe, MARKER_PREFIX};
pub use memcache::{MemcacheProbe, MemcacheServer};
pub use redis::RedisProbe;

use crate::config::Settings;
use crate::core::outcome::Outcome;
use crate::utils::error::Result;
use async_trait::async_trait;
use futures::FutureExt;
use sea_orm::DatabaseConnection;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

/// Explicit outputs threaded between probes by the runner.
///
/// This is the only mutable state that crosses probe boundaries: settings
/// and the database handle from bootstrap, and the marker-file path from
/// the filesystem-create probe.
#[derive(Debug, Default)]
pub struct ProbeContext {
    /// Settings exposed by the bootstrap probe.
    pub settings: Option<Arc<Settings>>,
    /// Live database handle opened during bootstrap.
    pub db: Option<DatabaseConnection>,
    /// Marker file created by the filesystem-create probe.
    pub marker_file: Option<PathBuf>,
}

/// One independent dependency check.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Stable identifier, used as the result-set key and in logs.
    fn name(&self) -> &'static str;

    /// Perform the check.
    ///
    /// Failures surface as `Err` and are converted into `error` outcomes by
    /// [`run_guarded`]; they never propagate to the runner.
    async fn run(&self, ctx: &mut ProbeContext) -> Result<Outcome>;
}

/// Safety boundary around probe execution.
pub async fn run_guarded(probe: &dyn Probe, ctx: &mut ProbeContext) -> Outcome {
    match AssertUnwindSafe(probe.run(ctx)).catch_unwind().await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(err)) => Outcome::internal_fault(probe.name(), &err.to_string()),
        Err(panic) => Outcome::internal_fault(probe.name(), &panic_text(panic)),
    }
}

fn panic_text(panic: Box<dyn Any + Send>) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "panic".to_string()
    }
}
