use crate::models::DocumentMime;
use anyhow::{Result, anyhow};
use serde::Serialize;
use std::path::Path;
use utoipa::ToSchema;

/// Maximum document size: 10 MiB
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10 MiB

/// Allowed MIME types: PDF and DOCX only
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

pub const INVALID_FILE_TYPE: &str = "INVALID_FILE_TYPE";
pub const FILE_TOO_LARGE: &str = "FILE_TOO_LARGE";

/// Fallback used when an upload carries no usable filename.
pub const DEFAULT_FILENAME: &str = "documento";

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validation limits published to clients so they can check before sending.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ValidationRules {
    pub allowed_mime_types: Vec<String>,
    pub allowed_extensions: Vec<String>,
    pub max_file_size: u64,
}

impl ValidationRules {
    pub fn new(max_file_size: u64) -> Self {
        Self {
            allowed_mime_types: ALLOWED_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
            allowed_extensions: DocumentMime::ALL
                .iter()
                .map(|m| format!(".{}", m.extension()))
                .collect(),
            max_file_size,
        }
    }
}

/// Validates file size against maximum limit
pub fn validate_file_size(size: u64, max_size: u64) -> Result<()> {
    if size > max_size {
        return Err(anyhow!(ValidationError {
            code: FILE_TOO_LARGE,
            message: format!(
                "The file must be at most {}MB ({} bytes received)",
                max_size / 1024 / 1024,
                size
            ),
        }));
    }
    Ok(())
}

/// Validates MIME type against allowlist
pub fn validate_mime_type(content_type: &str) -> Result<DocumentMime> {
    DocumentMime::from_content_type(content_type).ok_or_else(|| {
        anyhow!(ValidationError {
            code: INVALID_FILE_TYPE,
            message: format!(
                "Unsupported file type '{}'. Please select a PDF or DOCX file",
                content_type
            ),
        })
    })
}

/// Reduces an uploaded name to a single path component that is safe inside
/// a quoted `Content-Disposition` filename.
pub fn sanitize_filename(filename: &str) -> String {
    // Browsers may send either separator, so split on both before taking the last part
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path components stripped from uploaded filename: {}", filename);
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control() || c == '"' || c == '\\' || c == '/' {
                '_'
            } else {
                c
            }
        })
        .collect();

    // Limit length safely for UTF-8
    let sanitized = if sanitized.len() > 255 {
        let mut end = 255;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    };

    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        return DEFAULT_FILENAME.to_string();
    }

    sanitized
}

/// Derives the name of the formatted document: `<stem>-abnt<ext>`.
///
/// A leading dot does not start an extension, so `.hidden` becomes
/// `.hidden-abnt`.
pub fn formatted_filename(original: &str) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(original);

    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}-abnt.{}", stem, ext),
        None => format!("{}-abnt", stem),
    }
}

/// Returns the validation code carried by an error, if any.
pub fn validation_code(err: &anyhow::Error) -> Option<&'static str> {
    err.downcast_ref::<ValidationError>().map(|e| e.code)
}

/// Renders a byte count the way the upload preview shows it.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut i = 0;
    while i + 1 < UNITS.len() && bytes >= 1u64 << (10 * (i + 1)) {
        i += 1;
    }
    let value = bytes as f64 / (1u64 << (10 * i)) as f64;

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[i])
}
