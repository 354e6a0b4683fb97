//! Text extraction: turns an uploaded resume into plain text.
//!
//! Dispatches on the declared document type. Every path resolves to an
//! `ExtractionResult`: parser failures (and parser panics on hostile input)
//! become `Failure`, they never escape to the caller.

pub mod docx;
pub mod pdf;

use std::panic::{catch_unwind, AssertUnwindSafe};

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_PLAIN_TEXT: &str = "text/plain";

const MIME_OCTET_STREAM: &str = "application/octet-stream";

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Declared format of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Pdf,
    Docx,
    PlainText,
    Unknown,
}

impl DocumentType {
    /// Maps a MIME type to a document type. Parameters (`; charset=...`) and
    /// case are ignored.
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            MIME_PDF => DocumentType::Pdf,
            MIME_DOCX => DocumentType::Docx,
            MIME_PLAIN_TEXT => DocumentType::PlainText,
            _ => DocumentType::Unknown,
        }
    }

    /// Resolves the type of an upload from its declared content type, falling
    /// back to the file extension when the client sent no usable type.
    pub fn detect(content_type: Option<&str>, file_name: &str) -> Self {
        match content_type.map(str::trim) {
            Some(ct) if !ct.is_empty() && !is_octet_stream(ct) => Self::from_mime(ct),
            _ => mime_guess::from_path(file_name)
                .first()
                .map(|mime| Self::from_mime(mime.essence_str()))
                .unwrap_or(DocumentType::Unknown),
        }
    }

    pub fn mime(&self) -> Option<&'static str> {
        match self {
            DocumentType::Pdf => Some(MIME_PDF),
            DocumentType::Docx => Some(MIME_DOCX),
            DocumentType::PlainText => Some(MIME_PLAIN_TEXT),
            DocumentType::Unknown => None,
        }
    }
}

fn is_octet_stream(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|essence| essence.trim().eq_ignore_ascii_case(MIME_OCTET_STREAM))
        .unwrap_or(false)
}

/// A resume as received from the client. Lives only for one evaluation.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub content: Bytes,
    pub declared_type: DocumentType,
    pub name: String,
    pub size_bytes: usize,
    /// Content type as sent by the client, if any.
    pub content_type: Option<String>,
}

impl UploadedDocument {
    pub fn new(name: impl Into<String>, declared_type: DocumentType, content: Bytes) -> Self {
        let size_bytes = content.len();
        Self {
            content,
            declared_type,
            name: name.into(),
            size_bytes,
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }

    /// The MIME type used to describe this upload: the client's declared type
    /// when it is usable, otherwise a guess from the file extension.
    pub fn content_type_label(&self) -> String {
        match self.content_type.as_deref().map(str::trim) {
            Some(ct) if !ct.is_empty() && !is_octet_stream(ct) => ct.to_string(),
            _ => mime_guess::from_path(&self.name)
                .first()
                .map(|mime| mime.essence_str().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionFailure {
    #[error("unsupported document type")]
    UnsupportedType,

    #[error("malformed document: {0}")]
    MalformedDocument(String),
}

/// Outcome of extraction. `Text` may be empty when the document holds no text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    Text(String),
    Failure(ExtractionFailure),
}

/// Parser-level errors. Collapsed into `ExtractionFailure::MalformedDocument`
/// at the `extract` boundary.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("PDF parsing failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("DOCX archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("DOCX XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("text is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("{part} inflates beyond {limit} bytes")]
    PartTooLarge { part: &'static str, limit: u64 },
}

// ────────────────────────────────────────────────────────────────────────────
// Extraction
// ────────────────────────────────────────────────────────────────────────────

/// Extracts plain text from an uploaded document.
pub fn extract(doc: &UploadedDocument) -> ExtractionResult {
    let parse: fn(&[u8]) -> Result<String, DocumentError> = match doc.declared_type {
        DocumentType::Pdf => pdf::extract_pdf_text,
        DocumentType::Docx => docx::extract_docx_text,
        DocumentType::PlainText => decode_plain_text,
        DocumentType::Unknown => {
            return ExtractionResult::Failure(ExtractionFailure::UnsupportedType);
        }
    };

    let outcome = catch_unwind(AssertUnwindSafe(|| parse(&doc.content)));

    match outcome {
        Ok(Ok(text)) => {
            debug!(
                document = %doc.name,
                kind = ?doc.declared_type,
                chars = text.chars().count(),
                "Extracted document text"
            );
            ExtractionResult::Text(text)
        }
        Ok(Err(e)) => {
            warn!(document = %doc.name, kind = ?doc.declared_type, "Extraction failed: {e}");
            ExtractionResult::Failure(ExtractionFailure::MalformedDocument(e.to_string()))
        }
        Err(_) => {
            warn!(document = %doc.name, kind = ?doc.declared_type, "Document parser panicked");
            ExtractionResult::Failure(ExtractionFailure::MalformedDocument(
                "document parser aborted on malformed input".to_string(),
            ))
        }
    }
}

fn decode_plain_text(data: &[u8]) -> Result<String, DocumentError> {
    let text = std::str::from_utf8(data)?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
}
