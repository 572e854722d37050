use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    handlers::AppState,
    middleware::auth::AuthenticatedUser,
    utils::file::image_content_type,
};

/// Streams the stored bytes of a scan back to its owner.
pub async fn get_image(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(scan_id): Path<Uuid>,
) -> Result<Response> {
    let scan = state
        .scans
        .find_by_id(scan_id)
        .await?
        .ok_or(AppError::NotFound("Scan not found"))?;
    user.ensure_owns(scan.user_id)?;

    let reader = state.storage.open(&scan.file_path).await?;
    let body = Body::from_stream(ReaderStream::new(reader));

    Ok((
        [
            (header::CONTENT_TYPE, image_content_type(&scan.file_name)),
            (header::CACHE_CONTROL, "private, max-age=3600"),
        ],
        body,
    )
        .into_response())
}
