//! Check orchestration
//!
//! Drives the probes in their fixed order, threads outputs of one probe
//! into the next, derives the overall outcome, and dispatches logging.
//! The run is strictly sequential; total latency is the sum of per-probe
//! latencies, each bounded by its own timeout.

use crate::config::Settings;
use crate::core::debug::TokenSources;
use crate::core::outcome::{payload_from, Outcome, Severity};
use crate::core::probe::{
    run_guarded, BootstrapProbe, CustomHook, CustomProbe, DbProbe, ElasticsearchProbe,
    FsCleanupProbe, FsCreateProbe, FsDeleteProbe, MemcacheProbe, Probe, ProbeContext,
    RedisProbe, ScriptHook, SettingsSource,
};
use crate::core::profile::Profile;
use crate::core::status::Status;
use crate::utils::error::PingError;
use crate::utils::logging::Logger;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Threshold above which a probe duration is logged as slow.
pub const SLOW_THRESHOLD_MS: u64 = 1000;

/// One health-check invocation.
pub struct Runner {
    source: SettingsSource,
    logger: Arc<dyn Logger>,
    hook: Option<Arc<dyn CustomHook>>,
    epoch: Instant,
    profile: Profile,
    status: Status,
    deadline: Option<Instant>,
    // Preset so that a run dying midway can never read as healthy; the
    // finishing phase corrects it.
    code: u16,
    message: &'static str,
}

/// Finished run: the overall decision plus the full result and timing sets.
pub struct RunReport {
    /// HTTP status code: 200 on success, 500 on any error outcome.
    pub code: u16,
    /// Status word paired with the code in the response body.
    pub message: &'static str,
    /// All probe outcomes, in execution order.
    pub status: Status,
    /// All probe durations.
    pub profile: Profile,
    /// The derived debug-access token for this invocation.
    pub debug_token: String,
}

impl RunReport {
    /// The `"<MESSAGE> <CODE>"` status line.
    ///
    /// Message and code are deliberately separate tokens so automated
    /// monitors have to match both.
    pub fn status_line(&self) -> String {
        format!("{} {}", self.message, self.code)
    }

    /// Whether a caller-supplied debug value unlocks the tables.
    pub fn debug_authorized(&self, supplied: Option<&str>) -> bool {
        supplied.is_some_and(|value| !value.is_empty() && value == self.debug_token)
    }

    /// Render the response body; diagnostic tables only when authorized.
    pub fn body(&self, debug: bool) -> String {
        let mut out = format!("{}\n", self.status_line());
        if debug {
            out.push('\n');
            out.push_str(&self.status.text_table("\n"));
            out.push_str("\n\n");
            out.push_str(&self.profile.text_table("\n"));
            out.push('\n');
        }
        out
    }
}

impl Runner {
    /// Set up a run. `epoch` is the earliest instant known for this
    /// invocation (process entry or request arrival).
    pub fn new(source: SettingsSource, logger: Arc<dyn Logger>, epoch: Instant) -> Self {
        Self {
            source,
            logger,
            hook: None,
            epoch,
            profile: Profile::new(epoch),
            status: Status::new(),
            deadline: None,
            code: 503,
            message: "SERVICE UNAVAILABLE",
        }
    }

    /// Inject a custom extension hook, overriding any script configured in
    /// settings.
    pub fn with_hook(mut self, hook: Arc<dyn CustomHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Execute the full probe sequence and produce the report.
    pub async fn run(mut self) -> RunReport {
        let mut ctx = ProbeContext::default();

        // Bootstrap first: it exposes settings for everything after it.
        let bootstrap = BootstrapProbe::new(self.source.clone());
        self.step(&bootstrap, &mut ctx).await;

        let settings = ctx
            .settings
            .clone()
            .unwrap_or_else(|| Arc::new(Settings::default()));
        self.deadline = settings
            .run_deadline_ms
            .map(|ms| self.epoch + Duration::from_millis(ms));

        self.step(&DbProbe::from_settings(&settings), &mut ctx).await;

        match MemcacheProbe::from_settings(&settings) {
            Ok(probe) => self.step(&probe, &mut ctx).await,
            Err(err) => self.config_fault("memcache", &err),
        }

        self.step(&RedisProbe::from_settings(&settings), &mut ctx)
            .await;
        self.step(&ElasticsearchProbe::from_settings(&settings), &mut ctx)
            .await;
        self.step(&FsCreateProbe::from_settings(&settings), &mut ctx)
            .await;
        self.step(&FsDeleteProbe::new(), &mut ctx).await;
        self.step(&FsCleanupProbe::from_settings(&settings), &mut ctx)
            .await;

        let hook = self.hook.clone().or_else(|| {
            settings
                .custom_check
                .as_ref()
                .map(|path| Arc::new(ScriptHook::new(path.clone())) as Arc<dyn CustomHook>)
        });
        self.step(&CustomProbe::new(hook), &mut ctx).await;

        self.finish(&settings)
    }

    /// Run one probe under the profiler and the safety boundary.
    async fn step(&mut self, probe: &dyn Probe, ctx: &mut ProbeContext) {
        let name = probe.name();

        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                self.status.set(
                    name,
                    Outcome::error(payload_from(json!({"message": "Run deadline exceeded."}))),
                );
                return;
            }
        }

        let outcome = self.profile.measure(name, run_guarded(probe, ctx)).await;
        self.status.set(name, outcome);
    }

    /// Record a configuration problem as that probe's error outcome.
    fn config_fault(&mut self, name: &str, err: &PingError) {
        self.status.set(
            name,
            Outcome::error(payload_from(json!({
                "message": "Invalid configuration.",
                "error": err.to_string(),
            }))),
        );
    }

    fn finish(mut self, settings: &Settings) -> RunReport {
        self.profile.stop();

        for (name, duration_ms) in self.profile.by_duration(Some(SLOW_THRESHOLD_MS), None) {
            self.logger
                .log("slow", &name, &format!("duration={duration_ms:.3} ms"));
        }

        for (name, message) in self.status.by_severity(Severity::Warning) {
            self.logger.log("warning", &name, &message);
        }

        let errors = self.status.by_severity(Severity::Error);
        if errors.is_empty() {
            self.code = 200;
            self.message = "CONGRATULATIONS";
        } else {
            for (name, message) in &errors {
                self.logger.log("error", name, message);
            }
            self.code = 500;
            self.message = "INTERNAL ERROR";
        }

        RunReport {
            code: self.code,
            message: self.message,
            status: self.status,
            profile: self.profile,
            debug_token: TokenSources::gather(settings).derive(),
        }
    }
}
