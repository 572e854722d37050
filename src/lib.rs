use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod reports;
pub mod services;
pub mod storage;
pub mod utils;

use handlers::{auth as auth_handlers, docs, health, images, metrics, reports as report_handlers, scans, AppState};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

fn cors_layer(origins: Vec<String>) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

pub fn create_app(state: AppState) -> Router {
    let upload_limit = state.config.max_file_size + MULTIPART_OVERHEAD;

    let mut app = Router::new()
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/api/auth/signin", get(auth_handlers::signin))
        .route("/api/auth/callback/google", get(auth_handlers::callback))
        .route("/api/auth/session", get(auth_handlers::session))
        .route("/api/auth/signout", post(auth_handlers::signout))
        .route("/api/scans", get(scans::list_scans))
        .route(
            "/api/scans/upload",
            post(scans::upload_scan).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/scans/analyze/:id",
            get(scans::analyze_scan).post(scans::analyze_scan),
        )
        .route("/api/scans/:id/analyze", post(scans::analyze_scan))
        .route("/api/reports", get(report_handlers::list_reports))
        .route("/api/reports/:id", get(report_handlers::get_report))
        .route("/api/reports/download/:id", get(report_handlers::download_report))
        .route("/api/reports/view/:id", get(report_handlers::view_report))
        .route("/api/images/:scan_id", get(images::get_image))
        .merge(docs::create_docs_router());

    if let Some(dir) = &state.config.static_dir {
        tracing::info!("Serving static files from {}", dir);
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(axum::middleware::from_fn_with_state(
        state.clone(),
        middleware::metrics::metrics_middleware,
    ))
    .layer(TraceLayer::new_for_http())
    .layer(CompressionLayer::new())
    .layer(cors_layer(state.config.cors_origins()))
    .with_state(state)
}
