//! Search-cluster probe
//!
//! Issues a cluster-health request to every configured connection. Each
//! connection carries its own failure policy, so a single probe can treat
//! one cluster as critical and another as best-effort; any error-tagged
//! failure escalates the whole probe.

use super::{Probe, ProbeContext};
use crate::config::{EsConnection, FailureSeverity, Settings};
use crate::core::outcome::{payload_from, Outcome};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);
const HEALTH_PATH: &str = "/_cluster/health";
const HEALTHY_STATUS: &str = "green";

/// The search-cluster health check.
pub struct ElasticsearchProbe {
    connections: Vec<EsConnection>,
}

impl ElasticsearchProbe {
    /// Create a probe over an explicit connection list.
    pub fn new(connections: Vec<EsConnection>) -> Self {
        Self { connections }
    }

    /// Extract the connection list from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.elasticsearch.connections.clone())
    }

    fn url(connection: &EsConnection) -> String {
        format!(
            "{}://{}:{}{}",
            connection.proto, connection.host, connection.port, HEALTH_PATH
        )
    }

    /// Check a single connection; `Err` carries the failure description.
    async fn poke(
        client: &reqwest::Client,
        connection: &EsConnection,
    ) -> std::result::Result<(), String> {
        let url = Self::url(connection);

        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("url={url} - {e}"))?;
        let body = response
            .text()
            .await
            .map_err(|e| format!("url={url} - {e}"))?;

        if body.is_empty() {
            return Err(format!("url={url} - Empty response"));
        }
        let data: serde_json::Value = serde_json::from_str(&body)
            .map_err(|_| format!("url={url} - Unable to decode JSON response"))?;
        let Some(status) = data.get("status").and_then(|s| s.as_str()) else {
            return Err(format!("url={url} - Response does not contain status"));
        };
        if status != HEALTHY_STATUS {
            return Err(format!("url={url} status={status} - Not green"));
        }
        Ok(())
    }
}

#[async_trait]
impl Probe for ElasticsearchProbe {
    fn name(&self) -> &'static str {
        "elasticsearch"
    }

    async fn run(&self, _ctx: &mut ProbeContext) -> Result<Outcome> {
        if self.connections.is_empty() {
            return Ok(Outcome::disabled());
        }

        let client = reqwest::Client::builder()
            .connect_timeout(REQUEST_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .user_agent("ping")
            .build()?;

        let mut failures: Vec<(FailureSeverity, String)> = Vec::new();
        for connection in &self.connections {
            if let Err(message) = Self::poke(&client, connection).await {
                failures.push((connection.severity, message));
            }
        }

        if failures.is_empty() {
            return Ok(Outcome::success());
        }

        let escalated = failures
            .iter()
            .any(|(severity, _)| *severity == FailureSeverity::Error);
        let messages: Vec<&String> = failures.iter().map(|(_, message)| message).collect();
        let payload = payload_from(json!({
            "message": "Cluster health failures.",
            "failures": messages,
        }));

        Ok(if escalated {
            Outcome::error(payload)
        } else {
            Outcome::warning(payload)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::outcome::Severity;
    use crate::core::probe::run_guarded;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn cluster_with_status(status: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(HEALTH_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"status": status})),
            )
            .mount(&server)
            .await;
        server
    }

    fn connection(server: &MockServer, severity: FailureSeverity) -> EsConnection {
        let address = server.address();
        EsConnection {
            proto: "http".to_string(),
            host: address.ip().to_string(),
            port: address.port(),
            severity,
        }
    }

    #[tokio::test]
    async fn test_disabled_without_connections() {
        let probe = ElasticsearchProbe::new(Vec::new());
        let mut ctx = ProbeContext::default();
        let outcome = run_guarded(&probe, &mut ctx).await;
        assert_eq!(outcome.severity(), Severity::Disabled);
        assert!(outcome.payload().is_empty());
    }

    #[tokio::test]
    async fn test_green_cluster_is_success() {
        let server = cluster_with_status("green").await;
        let probe = ElasticsearchProbe::new(vec![connection(&server, FailureSeverity::Error)]);
        let mut ctx = ProbeContext::default();

        let outcome = run_guarded(&probe, &mut ctx).await;
        assert_eq!(outcome.severity(), Severity::Success);
    }

    #[tokio::test]
    async fn test_yellow_cluster_is_not_green() {
        let server = cluster_with_status("yellow").await;
        let probe = ElasticsearchProbe::new(vec![connection(&server, FailureSeverity::Warning)]);
        let mut ctx = ProbeContext::default();

        let outcome = run_guarded(&probe, &mut ctx).await;
        assert_eq!(outcome.severity(), Severity::Warning);
        let failures = outcome.payload()["failures"].as_array().unwrap();
        assert!(failures[0].as_str().unwrap().contains("status=yellow"));
    }

    #[tokio::test]
    async fn test_missing_status_field_is_bad() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(HEALTH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"cluster": "x"})))
            .mount(&server)
            .await;

        let probe = ElasticsearchProbe::new(vec![connection(&server, FailureSeverity::Error)]);
        let mut ctx = ProbeContext::default();
        let outcome = run_guarded(&probe, &mut ctx).await;
        assert_eq!(outcome.severity(), Severity::Error);
        let failures = outcome.payload()["failures"].as_array().unwrap();
        assert!(failures[0]
            .as_str()
            .unwrap()
            .contains("Response does not contain status"));
    }

    #[tokio::test]
    async fn test_unparseable_body_is_bad() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(HEALTH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let probe = ElasticsearchProbe::new(vec![connection(&server, FailureSeverity::Warning)]);
        let mut ctx = ProbeContext::default();
        let outcome = run_guarded(&probe, &mut ctx).await;
        assert_eq!(outcome.severity(), Severity::Warning);
        let failures = outcome.payload()["failures"].as_array().unwrap();
        assert!(failures[0]
            .as_str()
            .unwrap()
            .contains("Unable to decode JSON response"));
    }

    #[tokio::test]
    async fn test_warning_tagged_failure_stays_a_warning() {
        let green = cluster_with_status("green").await;
        let red = cluster_with_status("red").await;
        let probe = ElasticsearchProbe::new(vec![
            connection(&green, FailureSeverity::Warning),
            connection(&red, FailureSeverity::Warning),
        ]);
        let mut ctx = ProbeContext::default();

        let outcome = run_guarded(&probe, &mut ctx).await;
        assert_eq!(outcome.severity(), Severity::Warning);
        assert_eq!(outcome.payload()["failures"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_error_tagged_failure_escalates_the_probe() {
        let warn_bad = cluster_with_status("red").await;
        let error_bad = cluster_with_status("red").await;
        let probe = ElasticsearchProbe::new(vec![
            connection(&warn_bad, FailureSeverity::Warning),
            connection(&error_bad, FailureSeverity::Error),
        ]);
        let mut ctx = ProbeContext::default();

        let outcome = run_guarded(&probe, &mut ctx).await;
        // Both failures are aggregated under the worst severity present.
        assert_eq!(outcome.severity(), Severity::Error);
        assert_eq!(outcome.payload()["failures"].as_array().unwrap().len(), 2);
    }
}
