//! Configuration loading
//!
//! Precedence: YAML file (explicit path, `PING_CONFIG`, or `config/ping.yaml`
//! when present), then `PING_*` environment variable overrides.

use super::models::Settings;
use crate::utils::error::{PingError, Result};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

impl Settings {
    /// Load settings for one invocation.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut settings = match Self::config_file(config_path) {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                Self::from_yaml_file(&path)?
            }
            None => Self::default(),
        };
        settings.apply_env()?;
        Ok(settings)
    }

    /// Parse a YAML settings file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    fn config_file(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = env::var("PING_CONFIG") {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        let default = Path::new("config/ping.yaml");
        default.exists().then(|| default.to_path_buf())
    }

    /// Overlay `PING_*` environment variables onto the loaded settings.
    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = env::var("PING_DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Ok(query) = env::var("PING_DATABASE_SENTINEL_QUERY") {
            self.database.sentinel_query = query;
        }
        if let Ok(servers) = env::var("PING_MEMCACHE_SERVERS") {
            self.memcache.servers = parse_server_map(&servers)?;
        }
        if let Ok(host) = env::var("PING_REDIS_HOST") {
            self.redis.host = Some(host);
        }
        if let Ok(port) = env::var("PING_REDIS_PORT") {
            self.redis.port = Some(
                port.parse()
                    .map_err(|e| PingError::Config(format!("Invalid redis port: {e}")))?,
            );
        }
        if let Ok(connections) = env::var("PING_ELASTICSEARCH_CONNECTIONS") {
            self.elasticsearch.connections = serde_json::from_str(&connections).map_err(|e| {
                PingError::Config(format!("Invalid elasticsearch connections: {e}"))
            })?;
        }
        if let Ok(path) = env::var("PING_FILES_PATH") {
            self.files.path = PathBuf::from(path);
        }
        if let Ok(secs) = env::var("PING_FILES_RETENTION_SECS") {
            self.files.retention_secs = secs
                .parse()
                .map_err(|e| PingError::Config(format!("Invalid retention window: {e}")))?;
        }
        if let Ok(secs) = env::var("PING_FILES_CLOCK_DRIFT_SECS") {
            self.files.clock_drift_secs = secs
                .parse()
                .map_err(|e| PingError::Config(format!("Invalid clock drift tolerance: {e}")))?;
        }
        if let Ok(token) = env::var("PING_DEBUG_TOKEN") {
            self.debug_token = Some(token);
        }
        if let Ok(salt) = env::var("PING_HASH_SALT") {
            self.hash_salt = Some(salt);
        }
        if let Ok(hostname) = env::var("PING_HOSTNAME") {
            self.hostname = Some(hostname);
        }
        if let Ok(path) = env::var("PING_CUSTOM_CHECK") {
            self.custom_check = Some(PathBuf::from(path));
        }
        if let Ok(ms) = env::var("PING_RUN_DEADLINE_MS") {
            self.run_deadline_ms = Some(
                ms.parse()
                    .map_err(|e| PingError::Config(format!("Invalid run deadline: {e}")))?,
            );
        }
        Ok(())
    }
}

/// Parse a `host:port=bin,host:port=bin` list into the server map.
fn parse_server_map(raw: &str) -> Result<BTreeMap<String, String>> {
    let mut servers = BTreeMap::new();
    for entry in raw.split(',').filter(|e| !e.trim().is_empty()) {
        let (address, bin) = entry
            .split_once('=')
            .ok_or_else(|| PingError::Config(format!("Invalid memcache server entry: {entry}")))?;
        servers.insert(address.trim().to_string(), bin.trim().to_string());
    }
    Ok(servers)
}
