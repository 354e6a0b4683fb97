use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::evaluation::parser::ParseError;

const EXTRACTION_MESSAGE: &str =
    "Unable to extract text from the uploaded file. Please check the file format.";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("No text could be extracted from the document")]
    EmptyExtraction,

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Input too large: {field} exceeds {limit}")]
    InputTooLarge { field: &'static str, limit: String },

    #[error("Evaluation service call failed: {0}")]
    ServiceCallFailure(String),

    #[error("Invalid evaluation response: {0}")]
    InvalidEvaluationResponse(#[from] ParseError),

    #[error("Invalid upload: {0}")]
    Multipart(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UnsupportedFileType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::MalformedDocument(_) | AppError::EmptyExtraction => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::MissingInput(_) | AppError::Multipart(_) => StatusCode::BAD_REQUEST,
            AppError::InputTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::ServiceCallFailure(_) | AppError::InvalidEvaluationResponse(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::UnsupportedFileType(_) => "UNSUPPORTED_FILE_TYPE",
            AppError::MalformedDocument(_) => "MALFORMED_DOCUMENT",
            AppError::EmptyExtraction => "EMPTY_EXTRACTION",
            AppError::MissingInput(_) => "MISSING_INPUT",
            AppError::InputTooLarge { .. } => "INPUT_TOO_LARGE",
            AppError::ServiceCallFailure(_) => "SERVICE_CALL_FAILURE",
            AppError::InvalidEvaluationResponse(_) => "INVALID_EVALUATION_RESPONSE",
            AppError::Multipart(_) => "INVALID_UPLOAD",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The message shown to the user. Internal detail stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            AppError::UnsupportedFileType(_) => {
                "Unsupported file type. Please upload a PDF, DOCX or TXT file.".to_string()
            }
            AppError::MalformedDocument(_) => EXTRACTION_MESSAGE.to_string(),
            AppError::EmptyExtraction => {
                format!("{EXTRACTION_MESSAGE} No text was found in the document.")
            }
            AppError::MissingInput(_) => {
                "Please upload a resume and enter a job description to proceed.".to_string()
            }
            AppError::InputTooLarge { field, limit } => {
                format!("The {field} is too large (limit: {limit}).")
            }
            AppError::ServiceCallFailure(_) => {
                "The evaluation service is unavailable. Please try again later.".to_string()
            }
            AppError::InvalidEvaluationResponse(_) => {
                "Failed to process response. Please try again.".to_string()
            }
            AppError::Multipart(reason) => format!("Invalid upload: {reason}"),
            AppError::Internal(e) => format!("An unexpected error occurred: {e}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), "{self}");
        } else {
            tracing::warn!(code = self.code(), "{self}");
        }

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.user_message()
            }
        }));

        (status, body).into_response()
    }
}
