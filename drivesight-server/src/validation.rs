//! Upload validation module
//!
//! Cheap checks on multipart metadata. The pipeline still sniffs magic bytes,
//! so a lying Content-Type cannot get a non-image through.

use crate::error::ApiError;

/// Allowed MIME type prefixes for uploads
const ALLOWED_MIME_PREFIXES: &[&str] = &["image/", "application/octet-stream"];

/// Validates the Content-Type of an uploaded file
///
/// Accepts image/* and application/octet-stream. A missing Content-Type is
/// treated as binary.
pub fn validate_content_type(content_type: Option<&str>) -> Result<(), ApiError> {
    match content_type {
        Some(ct) => {
            let ct_lower = ct.to_lowercase();
            if ALLOWED_MIME_PREFIXES
                .iter()
                .any(|prefix| ct_lower.starts_with(prefix))
            {
                Ok(())
            } else {
                Err(ApiError::invalid_image(format!(
                    "Unsupported Content-Type: '{ct}'. Allowed types: image/*, application/octet-stream"
                )))
            }
        }
        None => Ok(()),
    }
}

/// Validates the size of an uploaded file
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ApiError> {
    if size > max_size {
        let max_mb = max_size / (1024 * 1024);
        let actual_mb = size / (1024 * 1024);
        Err(ApiError::bad_request(format!(
            "File too large: {actual_mb} MB exceeds maximum of {max_mb} MB"
        )))
    } else {
        Ok(())
    }
}
