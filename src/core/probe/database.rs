//! Database probe
//!
//! Executes a trivial read query expected to return exactly one row. The
//! sentinel query is configurable; a row-count mismatch means the master
//! database is answering but not with valid data.

use super::{Probe, ProbeContext};
use crate::config::Settings;
use crate::core::outcome::{payload_from, Outcome};
use crate::utils::error::Result;
use async_trait::async_trait;
use sea_orm::{ConnectionTrait, Statement};
use serde_json::json;

const EXPECTED_ROWS: usize = 1;

/// The main database connectivity check.
pub struct DbProbe {
    url_configured: bool,
    sentinel_query: String,
}

impl DbProbe {
    /// Create a database probe with an explicit sentinel query.
    pub fn new(url_configured: bool, sentinel_query: impl Into<String>) -> Self {
        Self {
            url_configured,
            sentinel_query: sentinel_query.into(),
        }
    }

    /// Extract the probe configuration from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.database.url.is_some(),
            settings.database.sentinel_query.clone(),
        )
    }
}

#[async_trait]
impl Probe for DbProbe {
    fn name(&self) -> &'static str {
        "db"
    }

    async fn run(&self, ctx: &mut ProbeContext) -> Result<Outcome> {
        if !self.url_configured {
            return Ok(Outcome::disabled());
        }

        let Some(db) = ctx.db.as_ref() else {
            // Configured but bootstrap could not open the connection.
            return Ok(Outcome::error(payload_from(json!({
                "message": "No database connection available.",
            }))));
        };

        let statement =
            Statement::from_string(db.get_database_backend(), self.sentinel_query.as_str());
        let rows = db.query_all(statement).await?;

        if rows.len() == EXPECTED_ROWS {
            Ok(Outcome::success())
        } else {
            Ok(Outcome::error(payload_from(json!({
                "message": "Master database returned invalid results.",
                "actual_count": rows.len(),
                "expected_count": EXPECTED_ROWS,
            }))))
        }
    }
}
