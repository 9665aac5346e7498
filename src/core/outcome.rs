//! Probe outcome types
//!
//! Every probe invocation produces exactly one [`Outcome`]: a severity plus
//! a payload of diagnostic fields. Outcomes are created when the probe
//! returns and are immutable thereafter.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of one probe outcome.
///
/// Aggregation order is error > warning > success/disabled: any single
/// error flips the overall response to failure, warnings never do, and
/// disabled means the dependency is simply not configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The dependency is functional.
    Success,
    /// The dependency is not configured; never treated as failure.
    Disabled,
    /// Degraded but non-fatal.
    Warning,
    /// Probe-level failure.
    Error,
}

impl Severity {
    /// Lowercase identifier used in tables and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Disabled => "disabled",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic fields attached to an outcome.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Convert a `serde_json::json!` object literal into a payload map.
pub fn payload_from(value: serde_json::Value) -> Payload {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Payload::new(),
    }
}

/// The result of one probe invocation.
///
/// An empty payload is permitted only for `success` and `disabled`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    severity: Severity,
    payload: Payload,
}

impl Outcome {
    /// Outcome with an explicit severity and payload.
    pub fn new(severity: Severity, payload: Payload) -> Self {
        Self { severity, payload }
    }

    /// The dependency is functional.
    pub fn success() -> Self {
        Self::new(Severity::Success, Payload::new())
    }

    /// The dependency is not configured.
    pub fn disabled() -> Self {
        Self::new(Severity::Disabled, Payload::new())
    }

    /// Degraded but non-fatal.
    pub fn warning(payload: Payload) -> Self {
        Self::new(Severity::Warning, payload)
    }

    /// Probe-level failure.
    pub fn error(payload: Payload) -> Self {
        Self::new(Severity::Error, payload)
    }

    /// Error outcome produced by the probe safety boundary for faults that
    /// were not converted into a regular outcome by the probe itself.
    pub fn internal_fault(probe: &str, fault: &str) -> Self {
        let mut payload = Payload::new();
        payload.insert("message".into(), "Internal error.".into());
        payload.insert("function".into(), format!("{probe}::run").into());
        payload.insert("exception".into(), fault.into());
        Self::error(payload)
    }

    /// The severity of this outcome.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// The diagnostic payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Compact rendering of the payload; empty string when there is none.
    pub fn message(&self) -> String {
        if self.payload.is_empty() {
            String::new()
        } else {
            serde_json::Value::Object(self.payload.clone()).to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_severity_rendering() {
        assert_eq!(Severity::Success.to_string(), "success");
        assert_eq!(Severity::Disabled.to_string(), "disabled");
        assert_eq!(Severity::Warning.to_string(), "warning");
        assert_eq!(Severity::Error.to_string(), "error");
    }

    #[test]
    fn test_empty_payload_for_success_and_disabled() {
        assert!(Outcome::success().payload().is_empty());
        assert!(Outcome::disabled().payload().is_empty());
        assert_eq!(Outcome::success().message(), "");
    }

    #[test]
    fn test_error_message_rendering() {
        let outcome = Outcome::error(payload_from(json!({
            "message": "Master database returned invalid results.",
            "actual_count": 0,
            "expected_count": 1,
        })));
        assert_eq!(outcome.severity(), Severity::Error);
        let message = outcome.message();
        assert!(message.contains("\"actual_count\":0"));
        assert!(message.contains("Master database returned invalid results."));
    }

    #[test]
    fn test_internal_fault_payload() {
        let outcome = Outcome::internal_fault("db", "connection reset");
        assert_eq!(outcome.severity(), Severity::Error);
        assert_eq!(outcome.payload()["message"], "Internal error.");
        assert_eq!(outcome.payload()["function"], "db::run");
        assert_eq!(outcome.payload()["exception"], "connection reset");
    }
}
