use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Storage error: {0}")]
    Storage(String),

    /// Non-success answer from the inference service; the message is its `detail`.
    #[error("{0}")]
    Upstream(String),

    #[error("Inference service unreachable: {0}")]
    InferenceUnavailable(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Io(_)
            | AppError::Storage(_)
            | AppError::Upstream(_)
            | AppError::InferenceUnavailable(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                "Database error".to_string()
            }
            AppError::Migration(ref e) => {
                tracing::error!("Migration error: {}", e);
                "Database error".to_string()
            }
            AppError::Io(ref e) => {
                tracing::error!("IO error: {}", e);
                "Storage error".to_string()
            }
            AppError::Unauthorized => "Unauthorized".to_string(),
            AppError::Auth(ref msg) => {
                tracing::warn!("Authentication failed: {}", msg);
                msg.clone()
            }
            AppError::Validation(ref msg) => msg.clone(),
            AppError::NotFound(msg) => msg.to_string(),
            AppError::Storage(ref msg) => {
                tracing::error!("Storage error: {}", msg);
                "Storage error".to_string()
            }
            AppError::Upstream(ref detail) => {
                tracing::warn!("Inference service rejected request: {}", detail);
                detail.clone()
            }
            AppError::InferenceUnavailable(ref e) => {
                tracing::error!("Inference service unreachable: {}", e);
                "Failed to analyze image".to_string()
            }
            AppError::Config(ref msg) => {
                tracing::error!("Configuration error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {}", e);
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    async fn upstream_failure() -> Result<&'static str> {
        Err(AppError::Upstream("Model not loaded. Please try again later.".to_string()))
    }

    async fn missing_report() -> Result<&'static str> {
        Err(AppError::NotFound("Report not found"))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_upstream_detail_is_passed_through() {
        let app = Router::new().route("/test", get(upstream_failure));
        let response = app
            .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Model not loaded. Please try again later.");
        assert_eq!(body["status"], 500);
    }

    #[tokio::test]
    async fn test_not_found_carries_message() {
        let app = Router::new().route("/test", get(missing_report));
        let response = app
            .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Report not found");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Validation("No file uploaded".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Storage("disk full".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::Internal(anyhow::anyhow!("boom")).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_internal_details_are_not_leaked() {
        let response = AppError::Storage("/var/lib/secret/path".into()).into_response();
        let body = body_json(response).await;
        assert_eq!(body["error"], "Storage error");
    }
}
