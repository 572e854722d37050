use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::json;

use crate::{errors::Result, handlers::AppState};

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Process is up")),
    tag = "health"
)]
pub async fn liveness() -> Result<Json<serde_json::Value>> {
    Ok(Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Database reachable"),
        (status = 503, description = "Database unreachable")
    ),
    tag = "health"
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let db_status = match state.database.ping().await {
        Ok(()) => "healthy",
        Err(e) => {
            tracing::warn!("Readiness check failed: {}", e);
            "unhealthy"
        }
    };

    let (status, overall) = if db_status == "healthy" {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready")
    };

    (
        status,
        Json(json!({
            "status": overall,
            "checks": {
                "database": db_status
            },
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}
