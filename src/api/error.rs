use crate::utils::validation::{self, FILE_TOO_LARGE, INVALID_FILE_TYPE};
use axum::{
    Json,
    extract::{multipart::MultipartError, multipart::MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No file was uploaded")]
    MissingFile,

    #[error("{0}")]
    InvalidFileType(String),

    #[error("{0}")]
    FileTooLarge(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    /// Maps a validation failure onto the matching HTTP error.
    pub fn from_validation(err: anyhow::Error) -> Self {
        let message = err
            .downcast_ref::<validation::ValidationError>()
            .map(|e| e.message.clone())
            .unwrap_or_else(|| err.to_string());

        match validation::validation_code(&err) {
            Some(INVALID_FILE_TYPE) => AppError::InvalidFileType(message),
            Some(FILE_TOO_LARGE) => AppError::FileTooLarge(message),
            _ => AppError::BadRequest(message),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        // The body limit surfaces as a multipart read failure
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::FileTooLarge(err.body_text())
        } else {
            AppError::BadRequest(err.body_text())
        }
    }
}

impl From<MultipartRejection> for AppError {
    fn from(err: MultipartRejection) -> Self {
        // Not a multipart body at all, so there is no file part to read
        tracing::debug!("Upload without a multipart body: {}", err.body_text());
        AppError::MissingFile
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::MissingFile => (StatusCode::BAD_REQUEST, AppError::MissingFile.to_string()),
            AppError::InvalidFileType(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::FileTooLarge(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::{validate_file_size, validate_mime_type};

    #[test]
    fn test_validation_errors_map_to_variants() {
        let err = AppError::from_validation(validate_mime_type("image/png").unwrap_err());
        assert!(matches!(err, AppError::InvalidFileType(msg) if msg.contains("image/png")));

        let err = AppError::from_validation(validate_file_size(11, 10).unwrap_err());
        assert!(matches!(err, AppError::FileTooLarge(_)));

        let err = AppError::from_validation(anyhow::anyhow!("something else"));
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "something else"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::MissingFile.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::FileTooLarge("big".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal("boom".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
