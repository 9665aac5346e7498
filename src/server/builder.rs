//! HTTP server construction

use crate::server::routes;
use crate::server::state::AppState;
use actix_web::{web, App, HttpServer};
use std::env;
use tracing::info;

/// Bind address for the server binary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen host.
    pub host: String,
    /// Listen port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Read the bind address from `PING_HOST`/`PING_PORT`.
    pub fn from_env() -> std::io::Result<Self> {
        let mut config = Self::default();
        if let Ok(host) = env::var("PING_HOST") {
            config.host = host;
        }
        if let Ok(port) = env::var("PING_PORT") {
            config.port = port.parse().map_err(|e| {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("Invalid port: {e}"))
            })?;
        }
        Ok(config)
    }
}

/// Run the HTTP server until shutdown.
pub async fn run_server(state: AppState, config: ServerConfig) -> std::io::Result<()> {
    info!("pingd listening on {}:{}", config.host, config.port);

    let data = web::Data::new(state);
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .configure(routes::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
