//! Axum route handlers for the Evaluation API.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::pipeline::{
    evaluate_resume, EvaluationInput, EvaluationOutcome, KeywordOutcome,
};
use crate::extraction::{DocumentType, UploadedDocument};
use crate::state::AppState;

pub const FIELD_RESUME: &str = "resume";
pub const FIELD_JOB_DESCRIPTION: &str = "job_description";

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub name: String,
    pub size_bytes: usize,
    #[serde(rename = "type")]
    pub document_type: DocumentType,
    pub content_type: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum KeywordsResponse {
    Missing {
        image_png_base64: String,
        width: u32,
        height: u32,
        words: Vec<String>,
    },
    NoneMissing {
        message: String,
    },
    Unrenderable {
        message: String,
    },
}

#[derive(Debug, Serialize)]
pub struct EvaluationResponse {
    pub evaluation_id: Uuid,
    pub evaluated_at: DateTime<Utc>,
    pub document: DocumentResponse,
    pub match_percent: u8,
    pub match_display: String,
    pub missing_keywords: Vec<String>,
    pub profile_summary: String,
    pub keywords: KeywordsResponse,
}

impl From<EvaluationOutcome> for EvaluationResponse {
    fn from(outcome: EvaluationOutcome) -> Self {
        let match_display = outcome.match_display();
        let keywords = match outcome.keywords {
            KeywordOutcome::Missing(image) => KeywordsResponse::Missing {
                image_png_base64: STANDARD.encode(&image.png),
                width: image.width,
                height: image.height,
                words: image.words.into_iter().map(|w| w.text).collect(),
            },
            KeywordOutcome::NoneMissing { message } => KeywordsResponse::NoneMissing { message },
            KeywordOutcome::Unrenderable { message } => KeywordsResponse::Unrenderable { message },
        };

        EvaluationResponse {
            evaluation_id: outcome.evaluation_id,
            evaluated_at: outcome.evaluated_at,
            document: DocumentResponse {
                name: outcome.document.name,
                size_bytes: outcome.document.size_bytes,
                document_type: outcome.document.document_type,
                content_type: outcome.document.document_type.mime(),
            },
            match_percent: outcome.report.match_percent,
            match_display,
            missing_keywords: outcome.report.missing_keywords,
            profile_summary: outcome.report.profile_summary,
            keywords,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/evaluations
///
/// multipart/form-data with a `resume` file and a `job_description` text
/// field. Runs one evaluation synchronously and returns the report.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<EvaluationResponse>, AppError> {
    let input = read_evaluation_form(multipart, state.config.max_upload_bytes).await?;

    let outcome = evaluate_resume(
        input,
        state.evaluator.as_ref(),
        state.visualizer.as_ref(),
        &state.config.limits(),
    )
    .await?;

    Ok(Json(outcome.into()))
}

/// Collects the two form fields. Unknown fields are drained and ignored.
/// A file part with neither a name nor content counts as "no file", which is
/// what browsers send for an untouched file input.
async fn read_evaluation_form(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<EvaluationInput, AppError> {
    let mut input = EvaluationInput::default();
    let upload_error = |e: MultipartError| multipart_error(e, max_upload_bytes);

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        match field.name().unwrap_or_default() {
            FIELD_RESUME => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let content = field.bytes().await.map_err(upload_error)?;

                if file_name.is_empty() && content.is_empty() {
                    continue;
                }

                let declared_type = DocumentType::detect(content_type.as_deref(), &file_name);
                input.document = Some(
                    UploadedDocument::new(file_name, declared_type, content)
                        .with_content_type(content_type),
                );
            }
            FIELD_JOB_DESCRIPTION => {
                input.job_description = Some(field.text().await.map_err(upload_error)?);
            }
            _ => {
                field.bytes().await.map_err(upload_error)?;
            }
        }
    }

    Ok(input)
}

fn multipart_error(e: MultipartError, max_upload_bytes: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::InputTooLarge {
            field: "upload",
            limit: format!("{max_upload_bytes} bytes"),
        }
    } else {
        AppError::Multipart(e.body_text())
    }
}
