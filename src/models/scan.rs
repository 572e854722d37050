use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// An uploaded image. `file_path` is relative to the storage root.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Scan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewScan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    pub scan: Scan,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScanListResponse {
    pub scans: Vec<Scan>,
}

/// Multipart body accepted by the upload endpoint.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}
