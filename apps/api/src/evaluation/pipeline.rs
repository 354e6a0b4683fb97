//! Evaluation pipeline: upload + job description in, outcome out.
//!
//! extract → bound checks → request → service call → parse → visualize.
//! Each evaluation is independent; nothing is persisted.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::parser::{parse, EvaluationReport};
use crate::evaluation::request::build;
use crate::extraction::{
    extract, DocumentType, ExtractionFailure, ExtractionResult, UploadedDocument,
};
use crate::llm_client::EvaluationClient;
use crate::visualization::{KeywordImage, KeywordVisualizer};

pub const NO_MISSING_KEYWORDS_MESSAGE: &str = "Great job! No missing keywords found.";
pub const UNRENDERABLE_KEYWORDS_MESSAGE: &str =
    "The missing keywords could not be rendered as an image.";

/// Raw inputs as collected from the request. Either may be absent.
#[derive(Debug, Default)]
pub struct EvaluationInput {
    pub document: Option<UploadedDocument>,
    pub job_description: Option<String>,
}

/// Upper bounds on input text, in characters.
#[derive(Debug, Clone, Copy)]
pub struct InputLimits {
    pub max_resume_chars: usize,
    pub max_job_description_chars: usize,
}

#[derive(Debug, Clone)]
pub struct DocumentSummary {
    pub name: String,
    pub size_bytes: usize,
    pub document_type: DocumentType,
}

#[derive(Debug, Clone)]
pub enum KeywordOutcome {
    Missing(KeywordImage),
    NoneMissing { message: String },
    /// Keywords exist but no image could be produced; the report still stands.
    Unrenderable { message: String },
}

#[derive(Debug, Clone)]
pub struct EvaluationOutcome {
    pub evaluation_id: Uuid,
    pub evaluated_at: DateTime<Utc>,
    pub document: DocumentSummary,
    pub report: EvaluationReport,
    pub keywords: KeywordOutcome,
}

impl EvaluationOutcome {
    /// The score as shown to the user, e.g. `"82%"`.
    pub fn match_display(&self) -> String {
        format!("{}%", self.report.match_percent)
    }
}

/// Runs one evaluation end to end.
pub async fn evaluate_resume(
    input: EvaluationInput,
    client: &dyn EvaluationClient,
    visualizer: &dyn KeywordVisualizer,
    limits: &InputLimits,
) -> Result<EvaluationOutcome, AppError> {
    let evaluation_id = Uuid::new_v4();

    let document = input
        .document
        .ok_or_else(|| AppError::MissingInput("resume".to_string()))?;
    let job_description = input
        .job_description
        .filter(|jd| !jd.trim().is_empty())
        .ok_or_else(|| AppError::MissingInput("job_description".to_string()))?;

    if job_description.chars().count() > limits.max_job_description_chars {
        return Err(AppError::InputTooLarge {
            field: "job description",
            limit: format!("{} characters", limits.max_job_description_chars),
        });
    }

    info!(
        %evaluation_id,
        document = %document.name,
        kind = ?document.declared_type,
        size_bytes = document.size_bytes,
        "Evaluation started"
    );

    let resume_text = match extract(&document) {
        ExtractionResult::Text(text) => text,
        ExtractionResult::Failure(ExtractionFailure::UnsupportedType) => {
            return Err(AppError::UnsupportedFileType(document.content_type_label()));
        }
        ExtractionResult::Failure(ExtractionFailure::MalformedDocument(reason)) => {
            return Err(AppError::MalformedDocument(reason));
        }
    };

    if resume_text.trim().is_empty() {
        return Err(AppError::EmptyExtraction);
    }

    let resume_chars = resume_text.chars().count();
    if resume_chars > limits.max_resume_chars {
        return Err(AppError::InputTooLarge {
            field: "resume",
            limit: format!("{} characters", limits.max_resume_chars),
        });
    }

    let request = build(&resume_text, &job_description);
    debug!(%evaluation_id, resume_chars, prompt_chars = request.prompt.len(), "Prompt built");

    let raw = client
        .evaluate(&request)
        .await
        .map_err(|e| AppError::ServiceCallFailure(e.to_string()))?;

    let report = parse(&raw)?;
    info!(
        %evaluation_id,
        match_percent = report.match_percent,
        missing_keywords = report.missing_keywords.len(),
        "Evaluation parsed"
    );

    let keywords = if report.missing_keywords.is_empty() {
        KeywordOutcome::NoneMissing {
            message: NO_MISSING_KEYWORDS_MESSAGE.to_string(),
        }
    } else {
        match visualizer.render(&report.missing_keywords) {
            Ok(image) => KeywordOutcome::Missing(image),
            Err(e) => {
                warn!(%evaluation_id, "Keyword visualization failed: {e}");
                KeywordOutcome::Unrenderable {
                    message: UNRENDERABLE_KEYWORDS_MESSAGE.to_string(),
                }
            }
        }
    };

    Ok(EvaluationOutcome {
        evaluation_id,
        evaluated_at: Utc::now(),
        document: DocumentSummary {
            name: document.name,
            size_bytes: document.size_bytes,
            document_type: document.declared_type,
        },
        report,
        keywords,
    })
}
