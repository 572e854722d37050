use std::path::Path;
use uuid::Uuid;

pub const DEFAULT_EXTENSION: &str = ".bin";
pub const DEFAULT_ORIGINAL_NAME: &str = "upload";

/// Extension of the client-supplied name including the dot, or `.bin` when the
/// name has none (or one that is not plain ASCII alphanumerics).
pub fn file_extension(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

pub fn generate_file_name(original_name: &str) -> String {
    format!("{}{}", Uuid::new_v4(), file_extension(original_name))
}

pub fn user_storage_path(user_id: Uuid, file_name: &str) -> String {
    format!("/uploads/{}/{}", user_id, file_name)
}

/// Declared MIME type, or `application/octet-stream` when the client sent none.
pub fn resolve_mime_type(declared: Option<&str>) -> String {
    declared
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string())
}

/// Content type used when serving a stored scan back to its owner.
pub fn image_content_type(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}
