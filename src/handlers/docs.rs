use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use crate::handlers::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::liveness,
        crate::handlers::health::readiness,
        crate::handlers::auth::session,
        crate::handlers::scans::list_scans,
        crate::handlers::scans::upload_scan,
        crate::handlers::scans::analyze_scan,
        crate::handlers::reports::list_reports,
        crate::handlers::reports::get_report,
        crate::handlers::reports::download_report,
        crate::handlers::reports::view_report,
    ),
    components(
        schemas(
            crate::models::Scan,
            crate::models::UploadForm,
            crate::models::UploadResponse,
            crate::models::ScanListResponse,
            crate::models::Report,
            crate::models::ReportListResponse,
            crate::models::AnalysisResponse,
            crate::models::SessionUser,
            crate::models::SessionResponse,
        )
    ),
    tags(
        (name = "scans", description = "Upload and analysis of radiographs"),
        (name = "reports", description = "Classification reports"),
        (name = "auth", description = "Session endpoints"),
        (name = "health", description = "Health check endpoints")
    ),
    info(
        title = "OsteoScan API",
        version = "0.1.0",
        description = "Bone density screening from X-ray uploads"
    )
)]
pub struct ApiDoc;

pub fn create_docs_router() -> Router<AppState> {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}
