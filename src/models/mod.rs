use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Document formats accepted for formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum DocumentMime {
    #[serde(rename = "application/pdf")]
    Pdf,
    #[serde(rename = "application/vnd.openxmlformats-officedocument.wordprocessingml.document")]
    Docx,
}

impl DocumentMime {
    pub const ALL: [DocumentMime; 2] = [DocumentMime::Pdf, DocumentMime::Docx];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentMime::Pdf => "application/pdf",
            DocumentMime::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentMime::Pdf => "pdf",
            DocumentMime::Docx => "docx",
        }
    }

    /// Parses a `Content-Type` value, ignoring parameters and case.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let parsed: mime::Mime = content_type.trim().parse().ok()?;
        let essence = parsed.essence_str().to_ascii_lowercase();
        Self::ALL.into_iter().find(|m| m.as_str() == essence)
    }

    /// Maps a file extension the way a browser file picker would.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        Self::ALL.into_iter().find(|m| m.extension() == ext)
    }
}

impl fmt::Display for DocumentMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file offered by the user before any validation has happened.
///
/// `mime_type` is whatever the picker reported and may be outside the
/// accepted set.
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub content: Bytes,
}

impl FileCandidate {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, content: Bytes) -> Self {
        Self {
            name: name.into(),
            size_bytes: content.len() as u64,
            mime_type: mime_type.into(),
            content,
        }
    }
}

/// A file that passed type and size validation and may be transmitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadableFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: DocumentMime,
    pub content: Bytes,
}

/// The document as received by the server, held in memory for one request.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub original_name: String,
    pub mime_type: DocumentMime,
    pub content: Bytes,
}

/// What the server sends back as an attachment.
#[derive(Debug, Clone)]
pub struct FormattedDocument {
    pub filename: String,
    pub mime_type: DocumentMime,
    pub content: Bytes,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
