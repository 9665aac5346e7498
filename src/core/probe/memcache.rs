//! Cache-cluster probe
//!
//! Verifies every configured memcache instance with basic networking
//! instead of a client library: open a socket, send `stats`, check the
//! first response line. Partial outage is a warning, total outage an error.

use super::{Probe, ProbeContext};
use crate::config::Settings;
use crate::core::outcome::{payload_from, Outcome};
use crate::utils::error::{PingError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);
const EXPECTED_PREFIX: &str = "STAT ";

/// One cache server endpoint parsed from a `"host:port" -> bin` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemcacheServer {
    /// Hostname.
    pub host: String,
    /// Port.
    pub port: u16,
    /// Cache bin served by this endpoint.
    pub bin: String,
}

/// The cache-cluster connectivity check.
pub struct MemcacheProbe {
    servers: Vec<MemcacheServer>,
}

impl MemcacheProbe {
    /// Create a probe over an explicit server list.
    pub fn new(servers: Vec<MemcacheServer>) -> Self {
        Self { servers }
    }

    /// Extract the server list from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut servers = Vec::with_capacity(settings.memcache.servers.len());
        for (address, bin) in &settings.memcache.servers {
            let (host, port) = address.split_once(':').ok_or_else(|| {
                PingError::Config(format!("Invalid memcache server address: {address}"))
            })?;
            let port = port.parse().map_err(|_| {
                PingError::Config(format!("Invalid memcache server port: {address}"))
            })?;
            servers.push(MemcacheServer {
                host: host.to_string(),
                port,
                bin: bin.clone(),
            });
        }
        Ok(Self::new(servers))
    }

    /// Check a single server; `Err` carries the failure description.
    async fn poke(server: &MemcacheServer) -> std::result::Result<(), String> {
        let address = format!("{}:{}", server.host, server.port);

        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(&address))
            .await
            .map_err(|_| "connect timed out".to_string())?
            .map_err(|e| e.to_string())?;

        let mut stream = BufReader::new(stream);
        timeout(CONNECT_TIMEOUT, stream.get_mut().write_all(b"stats\r\n"))
            .await
            .map_err(|_| "write timed out".to_string())?
            .map_err(|e| e.to_string())?;

        // Only the first line of the response matters.
        let mut line = String::new();
        timeout(CONNECT_TIMEOUT, stream.read_line(&mut line))
            .await
            .map_err(|_| "read timed out".to_string())?
            .map_err(|e| e.to_string())?;

        if line.starts_with(EXPECTED_PREFIX) {
            Ok(())
        } else {
            Err(format!(
                "response='{}' - Unexpected response",
                line.trim_end()
            ))
        }
    }
}

#[async_trait]
impl Probe for MemcacheProbe {
    fn name(&self) -> &'static str {
        "memcache"
    }

    async fn run(&self, _ctx: &mut ProbeContext) -> Result<Outcome> {
        if self.servers.is_empty() {
            return Ok(Outcome::disabled());
        }

        let mut good = 0usize;
        let mut failures = Vec::new();

        for server in &self.servers {
            match Self::poke(server).await {
                Ok(()) => good += 1,
                Err(error) => failures.push(json!({
                    "host": server.host,
                    "port": server.port,
                    "error": error,
                })),
            }
        }

        if failures.is_empty() {
            return Ok(Outcome::success());
        }

        if good > 0 {
            Ok(Outcome::warning(payload_from(json!({
                "message": "Connection warnings.",
                "warnings": failures,
            }))))
        } else {
            Ok(Outcome::error(payload_from(json!({
                "message": "Connection errors.",
                "errors": failures,
            }))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::outcome::Severity;
    use crate::core::probe::run_guarded;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    /// Minimal stats responder standing in for a memcache instance.
    async fn fake_memcache() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let (reader, mut writer) = socket.split();
                    let mut line = String::new();
                    let _ = BufReader::new(reader).read_line(&mut line).await;
                    let _ = writer.write_all(b"STAT pid 1\r\nEND\r\n").await;
                });
            }
        });
        addr
    }

    /// A port that refuses connections.
    async fn refused_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    fn server(addr: SocketAddr) -> MemcacheServer {
        MemcacheServer {
            host: addr.ip().to_string(),
            port: addr.port(),
            bin: "default".to_string(),
        }
    }

    #[test]
    fn test_from_settings_parses_addresses() {
        let mut settings = Settings::default();
        settings
            .memcache
            .servers
            .insert("host1:1234".to_string(), "test1".to_string());
        settings
            .memcache
            .servers
            .insert("host2:2345".to_string(), "test2".to_string());

        let probe = MemcacheProbe::from_settings(&settings).unwrap();
        assert_eq!(
            probe.servers,
            vec![
                MemcacheServer {
                    host: "host1".to_string(),
                    port: 1234,
                    bin: "test1".to_string()
                },
                MemcacheServer {
                    host: "host2".to_string(),
                    port: 2345,
                    bin: "test2".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_from_settings_rejects_bad_address() {
        let mut settings = Settings::default();
        settings
            .memcache
            .servers
            .insert("no-port-here".to_string(), "default".to_string());
        assert!(MemcacheProbe::from_settings(&settings).is_err());
    }

    #[tokio::test]
    async fn test_disabled_without_servers() {
        let probe = MemcacheProbe::new(Vec::new());
        let mut ctx = ProbeContext::default();
        let outcome = run_guarded(&probe, &mut ctx).await;
        assert_eq!(outcome.severity(), Severity::Disabled);
        assert!(outcome.payload().is_empty());
    }

    #[tokio::test]
    async fn test_all_reachable_is_success() {
        let a = fake_memcache().await;
        let b = fake_memcache().await;
        let probe = MemcacheProbe::new(vec![server(a), server(b)]);
        let mut ctx = ProbeContext::default();

        let outcome = run_guarded(&probe, &mut ctx).await;
        assert_eq!(outcome.severity(), Severity::Success);
    }

    #[tokio::test]
    async fn test_partial_outage_is_a_warning() {
        let good = fake_memcache().await;
        let bad = refused_port().await;
        let probe = MemcacheProbe::new(vec![
            server(good),
            MemcacheServer {
                host: "127.0.0.1".to_string(),
                port: bad,
                bin: "default".to_string(),
            },
        ]);
        let mut ctx = ProbeContext::default();

        let outcome = run_guarded(&probe, &mut ctx).await;
        assert_eq!(outcome.severity(), Severity::Warning);
        assert_eq!(outcome.payload()["message"], "Connection warnings.");
        assert_eq!(outcome.payload()["warnings"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_total_outage_is_an_error() {
        let bad1 = refused_port().await;
        let bad2 = refused_port().await;
        let probe = MemcacheProbe::new(vec![
            MemcacheServer {
                host: "127.0.0.1".to_string(),
                port: bad1,
                bin: "default".to_string(),
            },
            MemcacheServer {
                host: "127.0.0.1".to_string(),
                port: bad2,
                bin: "sessions".to_string(),
            },
        ]);
        let mut ctx = ProbeContext::default();

        let outcome = run_guarded(&probe, &mut ctx).await;
        assert_eq!(outcome.severity(), Severity::Error);
        assert_eq!(outcome.payload()["message"], "Connection errors.");
        assert_eq!(outcome.payload()["errors"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unexpected_response_is_bad() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let (reader, mut writer) = socket.split();
                let mut line = String::new();
                let _ = BufReader::new(reader).read_line(&mut line).await;
                let _ = writer.write_all(b"ERROR\r\n").await;
            }
        });

        let probe = MemcacheProbe::new(vec![server(addr)]);
        let mut ctx = ProbeContext::default();
        let outcome = run_guarded(&probe, &mut ctx).await;
        assert_eq!(outcome.severity(), Severity::Error);
        let errors = outcome.payload()["errors"].as_array().unwrap();
        assert!(errors[0]["error"]
            .as_str()
            .unwrap()
            .contains("Unexpected response"));
    }
}
