//! Debug-access token derivation
//!
//! Full diagnostic tables are only revealed to callers that present the
//! correct token. The token is never stored; it is recomputed per
//! invocation from a prioritized chain of sources so that every deployment
//! has one without explicit configuration.

use crate::config::Settings;
use sha2::{Digest, Sha256};
use std::env;

/// Inputs for token derivation, gathered from settings and environment.
///
/// Kept as a plain struct so the chain is testable without touching process
/// environment.
#[derive(Debug, Clone, Default)]
pub struct TokenSources {
    /// Explicit token from settings; always wins when present.
    pub explicit: Option<String>,
    /// Project name from the hosting environment.
    pub project: Option<String>,
    /// Environment name from the hosting environment.
    pub environment: Option<String>,
    /// Site-wide salt from settings.
    pub hash_salt: Option<String>,
    /// Hostname fallback; the last-resort source.
    pub hostname: String,
}

impl TokenSources {
    /// Gather sources from settings and process environment.
    pub fn gather(settings: &Settings) -> Self {
        Self {
            explicit: non_empty(settings.debug_token.clone()),
            project: non_empty(env::var("PROJECT_NAME").ok()),
            environment: non_empty(env::var("ENVIRONMENT_NAME").ok()),
            hash_salt: non_empty(settings.hash_salt.clone()),
            hostname: non_empty(settings.hostname.clone())
                .or_else(|| non_empty(env::var("HOSTNAME").ok()))
                .unwrap_or_else(|| "unknown-host".to_string()),
        }
    }

    /// Derive the token.
    ///
    /// Priority: explicit value, project/environment pair, hash salt,
    /// hostname. Deterministic for fixed inputs.
    pub fn derive(&self) -> String {
        if let Some(token) = &self.explicit {
            return token.clone();
        }
        if let (Some(project), Some(environment)) = (&self.project, &self.environment) {
            return sha256_hex(&format!("{project}-{environment}"));
        }
        if let Some(salt) = &self.hash_salt {
            return sha256_hex(salt);
        }
        sha256_hex(&self.hostname)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}
