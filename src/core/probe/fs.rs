//! Filesystem probes
//!
//! Prove write and delete capability on the shared storage location with a
//! zero-byte marker file, and clean up markers left behind by prior,
//! possibly-crashed invocations. Marker names embed the creation time so
//! that cleanup can tell stale leftovers from in-flight invocations on
//! other nodes.

use super::{Probe, ProbeContext};
use crate::config::Settings;
use crate::core::outcome::{payload_from, Outcome, Payload};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::json;
use std::fs;
use std::path::PathBuf;

/// Reserved filename prefix for marker files.
pub const MARKER_PREFIX: &str = "status_check__";

fn unix_secs_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Parse the unix timestamp embedded in a marker file name.
fn embedded_timestamp(name: &str) -> Option<u64> {
    let rest = name.strip_prefix(MARKER_PREFIX)?;
    let secs = match rest.split_once("__") {
        Some((secs, _)) => secs,
        None => rest,
    };
    secs.parse().ok()
}

/// Marker-file creation check.
pub struct FsCreateProbe {
    path: PathBuf,
}

impl FsCreateProbe {
    /// Create a probe over an explicit storage directory.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Extract the storage directory from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.files.path.clone())
    }
}

#[async_trait]
impl Probe for FsCreateProbe {
    fn name(&self) -> &'static str {
        "fs-scheme-create"
    }

    async fn run(&self, ctx: &mut ProbeContext) -> Result<Outcome> {
        let name = format!(
            "{MARKER_PREFIX}{}__{:08x}",
            unix_secs_now(),
            rand::random::<u32>()
        );
        let file = self.path.join(name);

        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file)
        {
            Ok(_) => {
                // The delete probe takes over from here.
                ctx.marker_file = Some(file);
                Ok(Outcome::success())
            }
            Err(err) => Ok(Outcome::error(payload_from(json!({
                "message": "Could not create file in the files directory.",
                "path": self.path.display().to_string(),
                "error": err.to_string(),
            })))),
        }
    }
}

/// Marker-file deletion check; depends on the create probe's output.
#[derive(Default)]
pub struct FsDeleteProbe;

impl FsDeleteProbe {
    /// Create the probe; the file to delete comes from the context.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Probe for FsDeleteProbe {
    fn name(&self) -> &'static str {
        "fs-scheme-delete"
    }

    async fn run(&self, ctx: &mut ProbeContext) -> Result<Outcome> {
        let Some(file) = ctx.marker_file.take() else {
            return Ok(Outcome::disabled());
        };

        match fs::remove_file(&file) {
            Ok(()) => Ok(Outcome::success()),
            Err(err) => Ok(Outcome::error(payload_from(json!({
                "message": "Could not delete newly created file in the files directory.",
                "file": file.display().to_string(),
                "error": err.to_string(),
            })))),
        }
    }
}

/// Leftover-marker cleanup check.
pub struct FsCleanupProbe {
    path: PathBuf,
    retention_secs: u64,
    clock_drift_secs: u64,
}

impl FsCleanupProbe {
    /// Create a probe with explicit retention and drift parameters.
    pub fn new(path: PathBuf, retention_secs: u64, clock_drift_secs: u64) -> Self {
        Self {
            path,
            retention_secs,
            clock_drift_secs,
        }
    }

    /// Extract the cleanup parameters from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.files.path.clone(),
            settings.files.retention_secs,
            settings.files.clock_drift_secs,
        )
    }
}

#[async_trait]
impl Probe for FsCleanupProbe {
    fn name(&self) -> &'static str {
        "fs-scheme-cleanup"
    }

    async fn run(&self, _ctx: &mut ProbeContext) -> Result<Outcome> {
        let entries = match fs::read_dir(&self.path) {
            Ok(entries) => entries,
            Err(err) => {
                return Ok(Outcome::error(payload_from(json!({
                    "message": "Unable to list files.",
                    "path": self.path.display().to_string(),
                    "error": err.to_string(),
                }))));
            }
        };

        let now = unix_secs_now();
        let mut removed = 0u64;
        let mut future = 0u64;

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    return Ok(Outcome::error(payload_from(json!({
                        "message": "Unable to list files.",
                        "path": self.path.display().to_string(),
                        "error": err.to_string(),
                    }))));
                }
            };

            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            if !name.starts_with(MARKER_PREFIX) {
                continue;
            }
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            // Names without a parseable timestamp may come from another
            // deployment's scheme; leave them alone.
            let Some(stamp) = embedded_timestamp(&name) else {
                continue;
            };
            if stamp > now + self.clock_drift_secs {
                future += 1;
                continue;
            }
            if metadata.len() != 0 {
                continue;
            }
            if now.saturating_sub(stamp) <= self.retention_secs {
                // Possibly an in-flight invocation on another node.
                continue;
            }

            let path = entry.path();
            if let Err(err) = fs::remove_file(&path) {
                return Ok(Outcome::error(payload_from(json!({
                    "message": "Could not delete file in the files directory.",
                    "file": path.display().to_string(),
                    "error": err.to_string(),
                }))));
            }
            removed += 1;
        }

        if removed == 0 && future == 0 {
            return Ok(Outcome::success());
        }

        let mut payload = Payload::new();
        if removed > 0 {
            payload.insert(
                "message".into(),
                "Orphaned status-check files deleted.".into(),
            );
            payload.insert("removed_count".into(), removed.into());
        }
        if future > 0 {
            payload
                .entry("message")
                .or_insert_with(|| "Future-dated status-check files found.".into());
            payload.insert("future_count".into(), future.into());
        }
        Ok(Outcome::warning(payload))
    }
}
