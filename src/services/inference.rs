use reqwest::{multipart, Client, Response};
use serde::Deserialize;

use crate::errors::{AppError, Result};
use crate::models::{ClassProbabilities, Scan};

const UPLOAD_FAILED: &str = "Failed to upload image to analysis service";
const PREDICT_FAILED: &str = "Failed to analyze image";
const FALLBACK_MIME_TYPE: &str = "image/png";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    image_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub predicted_class: String,
    pub confidence: f64,
    pub report_id: Option<String>,
    #[serde(default)]
    pub class_probabilities: Option<ClassProbabilities>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Client for the external classification service.
///
/// Analysis is two calls: `POST /upload/` with the image as multipart field
/// `file`, then `POST /predict/{image_id}`. Requests are not retried.
pub struct InferenceClient {
    client: Client,
    base_url: String,
}

impl InferenceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn analyze(&self, scan: &Scan, image: Vec<u8>) -> Result<Prediction> {
        let image_id = self.upload(scan, image).await?;
        tracing::debug!(scan_id = %scan.id, %image_id, "Image accepted by inference service");
        self.predict(&image_id).await
    }

    async fn upload(&self, scan: &Scan, image: Vec<u8>) -> Result<String> {
        let mime_type = scan
            .mime_type
            .parse::<mime::Mime>()
            .map(|m| m.to_string())
            .unwrap_or_else(|_| FALLBACK_MIME_TYPE.to_string());

        let part = multipart::Part::bytes(image)
            .file_name(scan.file_name.clone())
            .mime_str(&mime_type)?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/upload/", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let response = ensure_success(response, UPLOAD_FAILED).await?;
        let body: UploadResponse = response.json().await?;

        Ok(body.image_id)
    }

    async fn predict(&self, image_id: &str) -> Result<Prediction> {
        let response = self
            .client
            .post(format!("{}/predict/{}", self.base_url, image_id))
            .send()
            .await?;

        let response = ensure_success(response, PREDICT_FAILED).await?;
        let prediction: Prediction = response.json().await?;

        Ok(prediction)
    }
}

/// Turns a non-success response into `AppError::Upstream` carrying the
/// service's `detail` message, or `fallback` when it sent none.
async fn ensure_success(response: Response, fallback: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let detail = match response.json::<ErrorBody>().await {
        Ok(ErrorBody { detail: Some(serde_json::Value::String(detail)) }) if !detail.is_empty() => {
            detail
        }
        Ok(ErrorBody { detail: Some(other) }) if !other.is_null() => other.to_string(),
        _ => fallback.to_string(),
    };

    tracing::error!("Inference service returned {}: {}", status, detail);
    Err(AppError::Upstream(detail))
}
