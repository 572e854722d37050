use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    handlers::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        AnalysisResponse, NewReport, NewScan, Report, Scan, ScanListResponse, UploadForm,
        UploadResponse,
    },
    utils::file::{generate_file_name, resolve_mime_type, user_storage_path, DEFAULT_ORIGINAL_NAME},
};

struct UploadedFile {
    original_name: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::Validation("File too large".to_string())
    } else {
        AppError::Validation(format!("Failed to parse multipart data: {}", e))
    }
}

async fn read_file_field(multipart: &mut Multipart) -> Result<Option<UploadedFile>> {
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue; // Ignore unknown fields
        }

        let original_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?;

        // Browsers send an empty part when the file input was left blank.
        let blank = data.is_empty() && original_name.as_deref().map_or(true, str::is_empty);
        if !blank {
            file = Some(UploadedFile {
                original_name,
                content_type,
                data: data.to_vec(),
            });
        }
    }

    Ok(file)
}

#[utoipa::path(
    get,
    path = "/api/scans",
    responses(
        (status = 200, description = "Scans of the current user, newest first", body = ScanListResponse),
        (status = 401, description = "No valid session")
    ),
    tag = "scans"
)]
pub async fn list_scans(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ScanListResponse>> {
    let scans = state.scans.list_by_user(user.id).await?;
    Ok(Json(ScanListResponse { scans }))
}

#[utoipa::path(
    post,
    path = "/api/scans/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Scan stored", body = UploadResponse),
        (status = 400, description = "No file, malformed form or file too large"),
        (status = 401, description = "No valid session")
    ),
    tag = "scans"
)]
pub async fn upload_scan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let file = read_file_field(&mut multipart)
        .await?
        .ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;

    if file.data.len() > state.config.max_file_size {
        return Err(AppError::Validation("File too large".to_string()));
    }

    let original_name = file
        .original_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_ORIGINAL_NAME.to_string());
    let file_name = generate_file_name(&original_name);
    let file_path = user_storage_path(user.id, &file_name);

    state.storage.put(&file_path, &file.data).await?;

    let new_scan = NewScan {
        id: Uuid::new_v4(),
        user_id: user.id,
        file_name,
        file_path,
        original_name,
        mime_type: resolve_mime_type(file.content_type.as_deref()),
        size: file.data.len() as i64,
    };

    let scan = match state.scans.create(&new_scan).await {
        Ok(scan) => scan,
        Err(e) => {
            if let Err(cleanup) = state.storage.delete(&new_scan.file_path).await {
                tracing::error!(path = %new_scan.file_path, "Failed to remove orphaned upload: {}", cleanup);
            }
            return Err(e);
        }
    };

    state.metrics.record_upload();
    tracing::info!(scan_id = %scan.id, user_id = %user.id, size = scan.size, "Scan uploaded");

    Ok(Json(UploadResponse {
        success: true,
        scan,
    }))
}

async fn run_analysis(state: &AppState, scan: &Scan) -> Result<Report> {
    let image = state.storage.read(&scan.file_path).await?;
    let prediction = state.inference.analyze(scan, image).await?;

    state
        .reports
        .create(&NewReport {
            id: Uuid::new_v4(),
            scan_id: scan.id,
            user_id: scan.user_id,
            predicted_class: prediction.predicted_class,
            confidence: prediction.confidence,
            class_probabilities: prediction.class_probabilities,
            external_report_id: prediction.report_id,
        })
        .await
}

#[utoipa::path(
    get,
    path = "/api/scans/analyze/{id}",
    params(("id" = Uuid, Path, description = "Scan id")),
    responses(
        (status = 200, description = "Classification stored as a report", body = AnalysisResponse),
        (status = 401, description = "No valid session or scan owned by another user"),
        (status = 404, description = "Scan or its file not found"),
        (status = 500, description = "Inference service failure; message is the service's detail")
    ),
    tag = "scans"
)]
pub async fn analyze_scan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(scan_id): Path<Uuid>,
) -> Result<Json<AnalysisResponse>> {
    let scan = state
        .scans
        .find_by_id(scan_id)
        .await?
        .ok_or(AppError::NotFound("Scan not found"))?;
    user.ensure_owns(scan.user_id)?;

    let outcome = run_analysis(&state, &scan).await;
    state.metrics.record_analysis(outcome.is_ok());
    let report = outcome?;

    tracing::info!(
        report_id = %report.id,
        scan_id = %scan.id,
        predicted_class = %report.predicted_class,
        "Scan analyzed"
    );

    Ok(Json(AnalysisResponse::from(report)))
}
