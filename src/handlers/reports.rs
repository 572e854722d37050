use axum::{
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse, Json, Response},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    handlers::AppState,
    middleware::auth::AuthenticatedUser,
    models::{Report, ReportListResponse},
    reports::{render_html, render_text, text::attachment_file_name},
};

/// Missing reports are 404 before ownership is considered.
async fn owned_report(state: &AppState, user: &AuthenticatedUser, report_id: Uuid) -> Result<Report> {
    let report = state
        .reports
        .find_by_id(report_id)
        .await?
        .ok_or(AppError::NotFound("Report not found"))?;
    user.ensure_owns(report.user_id)?;

    Ok(report)
}

#[utoipa::path(
    get,
    path = "/api/reports",
    responses(
        (status = 200, description = "Reports of the current user, newest first", body = ReportListResponse),
        (status = 401, description = "No valid session")
    ),
    tag = "reports"
)]
pub async fn list_reports(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ReportListResponse>> {
    let reports = state.reports.list_by_user(user.id).await?;
    Ok(Json(ReportListResponse { reports }))
}

#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    params(("id" = Uuid, Path, description = "Report id")),
    responses(
        (status = 200, description = "Report", body = Report),
        (status = 401, description = "No valid session or report owned by another user"),
        (status = 404, description = "Report not found")
    ),
    tag = "reports"
)]
pub async fn get_report(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(report_id): Path<Uuid>,
) -> Result<Json<Report>> {
    Ok(Json(owned_report(&state, &user, report_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/reports/download/{id}",
    params(("id" = Uuid, Path, description = "Report id")),
    responses(
        (status = 200, description = "Plain-text report as an attachment", body = String, content_type = "text/plain"),
        (status = 401, description = "No valid session or report owned by another user"),
        (status = 404, description = "Report not found")
    ),
    tag = "reports"
)]
pub async fn download_report(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(report_id): Path<Uuid>,
) -> Result<Response> {
    let report = owned_report(&state, &user, report_id).await?;
    let disposition = format!("attachment; filename=\"{}\"", attachment_file_name(&report));

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        render_text(&report),
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/api/reports/view/{id}",
    params(("id" = Uuid, Path, description = "Report id")),
    responses(
        (status = 200, description = "Printable HTML report", body = String, content_type = "text/html"),
        (status = 401, description = "No valid session or report owned by another user"),
        (status = 404, description = "Report not found")
    ),
    tag = "reports"
)]
pub async fn view_report(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(report_id): Path<Uuid>,
) -> Result<Html<String>> {
    let report = owned_report(&state, &user, report_id).await?;
    let scan = state.scans.find_by_id(report.scan_id).await?;

    Ok(Html(render_html(&report, scan.as_ref(), Utc::now())))
}
