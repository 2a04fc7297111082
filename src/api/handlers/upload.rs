use crate::api::error::AppError;
use crate::models::UploadedDocument;
use crate::utils::disposition;
use crate::utils::validation::{
    ValidationRules, sanitize_filename, validate_file_size, validate_mime_type,
};
use axum::{
    Json,
    body::Body,
    extract::{
        Multipart, State,
        multipart::Field,
        multipart::MultipartRejection,
    },
    http::{StatusCode, header},
    response::Response,
};
use bytes::{Bytes, BytesMut};
use utoipa::ToSchema;

/// Multipart form accepted by `/api/upload`
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// PDF or DOCX document, at most 10 MiB
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Formatted document as an attachment", content_type = "application/octet-stream"),
        (status = 400, description = "Missing file, unsupported type or file too large", body = crate::models::ErrorResponse)
    ),
    tag = "documents"
)]
pub async fn upload_document(
    State(state): State<crate::AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let mut multipart = multipart?;
    let mut document: Option<UploadedDocument> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        // Plain text parts named `file` do not count as an upload
        let Some(original_name) = field.file_name().map(sanitize_filename) else {
            continue;
        };

        if document.is_some() {
            return Err(AppError::BadRequest(
                "Only one file may be uploaded per request".to_string(),
            ));
        }

        // 1. Reject disallowed types before reading the body
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let mime_type = validate_mime_type(&content_type).map_err(|e| {
            tracing::warn!("Rejected upload {}: {}", original_name, e);
            AppError::from_validation(e)
        })?;

        // 2. Buffer in memory, stopping as soon as the limit is crossed
        let content = read_limited(field, state.config.max_file_size).await?;

        document = Some(UploadedDocument {
            original_name,
            mime_type,
            content,
        });
    }

    let document = document.ok_or(AppError::MissingFile)?;
    tracing::info!(
        "📄 Formatting {} ({} bytes, {}) with {}",
        document.original_name,
        document.content.len(),
        document.mime_type,
        state.formatter.name()
    );

    let formatted = state
        .formatter
        .format(document)
        .await
        .map_err(|e| AppError::Internal(format!("Formatter failed: {:#}", e)))?;

    // Formatters may choose their own name; it still ends up in a quoted header
    let filename = sanitize_filename(&formatted.filename);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, formatted.mime_type.as_str())
        .header(header::CONTENT_DISPOSITION, disposition::attachment(&filename))
        .body(Body::from(formatted.content))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))
}

async fn read_limited(mut field: Field<'_>, max_size: u64) -> Result<Bytes, AppError> {
    let mut buffer = BytesMut::new();

    while let Some(chunk) = field.chunk().await? {
        let size = (buffer.len() + chunk.len()) as u64;
        validate_file_size(size, max_size).map_err(AppError::from_validation)?;
        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer.freeze())
}

#[utoipa::path(
    get,
    path = "/api/validation-rules",
    responses(
        (status = 200, description = "Accepted document types and size limit", body = ValidationRules)
    ),
    tag = "documents"
)]
pub async fn get_validation_rules(State(state): State<crate::AppState>) -> Json<ValidationRules> {
    Json(ValidationRules::new(state.config.max_file_size))
}
