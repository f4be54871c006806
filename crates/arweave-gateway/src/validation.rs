use crate::error::GatewayError;

/// Image types accepted by `POST /upload`
pub const ALLOWED_MIME_TYPES: [&str; 5] = [
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/gif",
    "image/bmp",
];

/// Allowance for multipart framing on top of the file size limit
pub const MULTIPART_OVERHEAD: usize = 16 * 1024;

/// Check the declared content type against the allow-list
pub fn validate_mime(content_type: Option<&str>) -> Result<&str, GatewayError> {
    content_type
        .filter(|ct| ALLOWED_MIME_TYPES.contains(ct))
        .ok_or_else(|| GatewayError::Validation("File type invalid.".to_string()))
}

/// Check the received file size
pub fn validate_size(size: usize, max: usize) -> Result<(), GatewayError> {
    if size == 0 {
        return Err(GatewayError::Validation("File is empty.".to_string()));
    }
    if size > max {
        return Err(GatewayError::Validation(
            "File size exceeds limit.".to_string(),
        ));
    }
    Ok(())
}
