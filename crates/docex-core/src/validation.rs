//! File acceptance policy.
//!
//! [`validate`] is the one check applied to every candidate file, whichever
//! entry point it came through. It never touches the file contents.

use std::path::Path;

use crate::models::SelectedFile;

/// Content types the extraction service accepts.
pub const ALLOWED_CONTENT_TYPES: [&str; 2] = ["application/pdf", "image/png"];

/// 10 MiB.
pub const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Only PDF and PNG files are allowed")]
    UnsupportedType { mime_type: String },

    #[error("File size must be less than 10MB")]
    FileTooLarge { size: u64, max: u64 },
}

/// Validate declared content type. The match is exact: no case folding and
/// no parameters.
pub fn validate_content_type(mime_type: &str) -> Result<(), ValidationError> {
    if !ALLOWED_CONTENT_TYPES.contains(&mime_type) {
        return Err(ValidationError::UnsupportedType {
            mime_type: mime_type.to_string(),
        });
    }

    Ok(())
}

/// Validate file size
pub fn validate_file_size(size: u64) -> Result<(), ValidationError> {
    if size > MAX_FILE_SIZE_BYTES {
        return Err(ValidationError::FileTooLarge {
            size,
            max: MAX_FILE_SIZE_BYTES,
        });
    }

    Ok(())
}

/// Type first, then size.
pub fn validate(candidate: &SelectedFile) -> Result<(), ValidationError> {
    validate_content_type(&candidate.mime_type)?;
    validate_file_size(candidate.size)?;
    Ok(())
}

/// Declared content type for a local file, derived from its extension.
pub fn content_type_for_path(path: &Path) -> &'static str {
    let extension = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
    {
        Some(extension) => extension,
        None => return FALLBACK_CONTENT_TYPE,
    };

    match extension.as_str() {
        // Documents
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "zip" => "application/zip",
        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        _ => {
            tracing::debug!(
                extension = %extension,
                "Unknown extension, declaring generic content type"
            );
            FALLBACK_CONTENT_TYPE
        }
    }
}
