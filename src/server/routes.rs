//! The ping endpoint
//!
//! One fixed entry point. Unauthenticated callers get the minimal status
//! line; the full diagnostic tables require the debug token.

use crate::core::runner::Runner;
use crate::server::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use std::time::Instant;
use tracing::debug;

/// Configure the ping route.
///
/// Deliberately no request-tracing or sampling middleware here: health
/// probes arrive often enough to skew any per-request statistics.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/_ping", web::get().to(ping));
}

#[derive(Debug, Deserialize)]
struct PingQuery {
    debug: Option<String>,
}

/// Run the full check sequence and answer with the status line.
async fn ping(state: web::Data<AppState>, query: web::Query<PingQuery>) -> HttpResponse {
    // Capture the epoch before any other work; it anchors the preboot row.
    let epoch = Instant::now();
    debug!("Ping requested");

    let mut runner = Runner::new(state.source.clone(), state.logger.clone(), epoch);
    if let Some(hook) = &state.hook {
        runner = runner.with_hook(hook.clone());
    }
    let report = runner.run().await;

    let debug_authorized = report.debug_authorized(query.debug.as_deref());
    let body = report.body(debug_authorized);

    let mut response = match report.code {
        200 => HttpResponse::Ok(),
        _ => HttpResponse::InternalServerError(),
    };
    response
        .content_type("text/plain; charset=utf-8")
        .body(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::core::probe::SettingsSource;
    use crate::utils::logging::BufferLogger;
    use actix_web::{test, App};
    use std::sync::Arc;

    fn test_state(settings: Settings) -> AppState {
        AppState::new(SettingsSource::Fixed(Arc::new(settings)))
            .with_logger(Arc::new(BufferLogger::new()))
    }

    fn disabled_settings(dir: &std::path::Path) -> Settings {
        let mut settings = Settings::default();
        settings.files.path = dir.to_path_buf();
        settings.debug_token = Some("route-token".to_string());
        settings
    }

    #[actix_web::test]
    async fn test_healthy_ping_is_minimal() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state(disabled_settings(dir.path()))))
                .configure(configure_routes),
        )
        .await;

        let request = test::TestRequest::get().uri("/_ping").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), 200);

        let body = test::read_body(response).await;
        assert_eq!(&body[..], b"CONGRATULATIONS 200\n");
    }

    #[actix_web::test]
    async fn test_wrong_debug_token_reveals_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state(disabled_settings(dir.path()))))
                .configure(configure_routes),
        )
        .await;

        let request = test::TestRequest::get()
            .uri("/_ping?debug=wrong")
            .to_request();
        let response = test::call_service(&app, request).await;
        let body = test::read_body(response).await;
        assert_eq!(&body[..], b"CONGRATULATIONS 200\n");
    }

    #[actix_web::test]
    async fn test_matching_debug_token_appends_tables() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state(disabled_settings(dir.path()))))
                .configure(configure_routes),
        )
        .await;

        let request = test::TestRequest::get()
            .uri("/_ping?debug=route-token")
            .to_request();
        let response = test::call_service(&app, request).await;
        let body = String::from_utf8(test::read_body(response).await.to_vec()).unwrap();

        assert!(body.starts_with("CONGRATULATIONS 200\n"));
        assert!(body.contains("bootstrap"));
        assert!(body.contains("fs-scheme-cleanup"));
        assert!(body.contains("ms - total"));
    }

    #[actix_web::test]
    async fn test_failing_probe_is_a_500() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = disabled_settings(dir.path());
        settings.database.url = Some("sqlite::memory:".to_string());
        settings.database.sentinel_query = "SELECT 1 WHERE 1 = 0".to_string();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state(settings)))
                .configure(configure_routes),
        )
        .await;

        let request = test::TestRequest::get().uri("/_ping").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), 500);

        let body = test::read_body(response).await;
        assert_eq!(&body[..], b"INTERNAL ERROR 500\n");
    }
}
