//! Custom extension probe
//!
//! The host application can plug one extra check into the sequence through
//! the [`CustomHook`] strategy. The core only calls the interface; deciding
//! whether a hook exists is the host wiring's job. [`ScriptHook`] adapts an
//! external script file to the contract.

use super::{Probe, ProbeContext};
use crate::core::outcome::{payload_from, Outcome, Payload, Severity};
use crate::utils::error::{PingError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

const SCRIPT_TIMEOUT: Duration = Duration::from_secs(2);

/// What a hook invocation reported back.
#[derive(Debug)]
pub enum HookReport {
    /// The extension point is not present; the probe reports `disabled`.
    Absent,
    /// The hook ran and chose not to set an outcome; defaults to `success`.
    Silent,
    /// The hook set its own outcome.
    Report(Outcome),
}

/// Host-provided extension point invoked by the custom-ping probe.
#[async_trait]
pub trait CustomHook: Send + Sync {
    /// Run the custom check.
    async fn run(&self, ctx: &ProbeContext) -> Result<HookReport>;
}

/// The custom extension check.
pub struct CustomProbe {
    hook: Option<Arc<dyn CustomHook>>,
}

impl CustomProbe {
    /// Create the probe; `None` means no extension point is wired.
    pub fn new(hook: Option<Arc<dyn CustomHook>>) -> Self {
        Self { hook }
    }
}

#[async_trait]
impl Probe for CustomProbe {
    fn name(&self) -> &'static str {
        "custom-ping"
    }

    async fn run(&self, ctx: &mut ProbeContext) -> Result<Outcome> {
        let Some(hook) = &self.hook else {
            return Ok(Outcome::disabled());
        };

        match hook.run(ctx).await? {
            HookReport::Absent => Ok(Outcome::disabled()),
            HookReport::Silent => Ok(Outcome::success()),
            HookReport::Report(outcome) => Ok(outcome),
        }
    }
}

/// One line of script output setting the hook's outcome.
#[derive(Debug, Deserialize)]
struct ScriptReport {
    severity: Severity,
    message: Option<String>,
}

/// Command-backed hook: runs an external script and maps its output.
///
/// Contract: missing file means the extension point is absent; exit 0 with
/// empty output means the script is happy; exit 0 with a JSON
/// `{"severity": ..., "message": ...}` line sets the outcome; a non-zero
/// exit is a failure.
pub struct ScriptHook {
    path: PathBuf,
}

impl ScriptHook {
    /// Create a hook over the given script path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl CustomHook for ScriptHook {
    async fn run(&self, _ctx: &ProbeContext) -> Result<HookReport> {
        if !self.path.exists() {
            return Ok(HookReport::Absent);
        }

        let output = timeout(
            SCRIPT_TIMEOUT,
            Command::new("sh")
                .arg(&self.path)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| {
            PingError::Timeout(format!(
                "custom check script timed out: {}",
                self.path.display()
            ))
        })??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout.trim();

        if !output.status.success() {
            return Ok(HookReport::Report(Outcome::error(payload_from(json!({
                "message": "Custom check failed.",
                "script": self.path.display().to_string(),
                "exit_code": output.status.code(),
                "output": line,
            })))));
        }

        if line.is_empty() {
            return Ok(HookReport::Silent);
        }

        let report: ScriptReport = serde_json::from_str(line).map_err(|_| {
            PingError::Config(format!("custom check produced unparseable output: {line}"))
        })?;

        let mut payload = Payload::new();
        match report.message {
            Some(message) => {
                payload.insert("message".into(), message.into());
            }
            None => {
                if !matches!(report.severity, Severity::Success | Severity::Disabled) {
                    payload.insert(
                        "message".into(),
                        "Custom check reported a problem.".into(),
                    );
                }
            }
        }
        Ok(HookReport::Report(Outcome::new(report.severity, payload)))
    }
}
