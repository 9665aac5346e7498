//! pingd - dependency health-check endpoint
//!
//! HTTP entry point: serves `GET /_ping` and runs the full check sequence
//! once per request.

use pingd::core::probe::SettingsSource;
use pingd::server::{self, AppState, ServerConfig};
use pingd::utils::logging;
use std::process::ExitCode;

#[actix_web::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let state = AppState::new(SettingsSource::Load { config_path: None });
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match server::run_server(state, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
