//! Key-value store probe
//!
//! One connection attempt against the configured redis endpoint. Both
//! addressing modes are handled: host plus port is TCP, host alone is a
//! unix socket path.

use super::{Probe, ProbeContext};
use crate::config::Settings;
use crate::core::outcome::{payload_from, Outcome};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// The key-value store connectivity check.
pub struct RedisProbe {
    host: Option<String>,
    port: Option<u16>,
}

impl RedisProbe {
    /// Create a probe for an explicit address.
    pub fn new(host: Option<String>, port: Option<u16>) -> Self {
        Self { host, port }
    }

    /// Extract the address from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.redis.host.clone(), settings.redis.port)
    }

    fn url(&self, host: &str) -> String {
        match self.port {
            Some(port) => format!("redis://{host}:{port}/"),
            None => format!("redis+unix://{host}"),
        }
    }
}

#[async_trait]
impl Probe for RedisProbe {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn run(&self, _ctx: &mut ProbeContext) -> Result<Outcome> {
        if self.host.is_none() && self.port.is_none() {
            return Ok(Outcome::disabled());
        }

        let Some(host) = self.host.as_deref() else {
            return Ok(Outcome::error(payload_from(json!({
                "message": "Unable to connect.",
                "host": serde_json::Value::Null,
                "port": self.port,
                "error": "no host configured",
            }))));
        };

        let url = self.url(host);
        let attempt = async {
            let client = redis::Client::open(url.as_str())?;
            let _connection = client.get_multiplexed_async_connection().await?;
            Ok::<(), redis::RedisError>(())
        };

        match timeout(CONNECT_TIMEOUT, attempt).await {
            Ok(Ok(())) => Ok(Outcome::success()),
            Ok(Err(err)) => Ok(Outcome::error(payload_from(json!({
                "message": "Unable to connect.",
                "host": host,
                "port": self.port,
                "error": err.to_string(),
            })))),
            Err(_) => Ok(Outcome::error(payload_from(json!({
                "message": "Unable to connect.",
                "host": host,
                "port": self.port,
                "error": "connection timed out",
            })))),
        }
    }
}
