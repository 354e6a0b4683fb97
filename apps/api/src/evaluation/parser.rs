//! Response parser: validates the evaluator's raw text and decodes it into an
//! `EvaluationReport`.
//!
//! The evaluator output is generative text that is only conventionally JSON,
//! so every field is checked explicitly instead of trusting a derive.
//! Unknown keys are ignored.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub const FIELD_MATCH: &str = "JD Match";
pub const FIELD_MISSING_KEYWORDS: &str = "MissingKeywords";
pub const FIELD_PROFILE_SUMMARY: &str = "Profile Summary";

/// Structured result of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationReport {
    /// 0 – 100
    pub match_percent: u8,
    pub missing_keywords: Vec<String>,
    pub profile_summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("response is missing required field \"{0}\"")]
    MissingField(&'static str),

    #[error("invalid match score: {0}")]
    InvalidMatchScore(String),

    #[error("\"MissingKeywords\" must be a list of strings")]
    InvalidKeywords,

    #[error("\"Profile Summary\" must be a string")]
    InvalidSummary,
}

/// Parses the raw evaluator response.
pub fn parse(raw: &str) -> Result<EvaluationReport, ParseError> {
    let body = strip_json_fences(raw);

    let value: Value =
        serde_json::from_str(body).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| ParseError::InvalidJson("top-level value is not an object".to_string()))?;

    // Presence is checked for all keys before any value is validated.
    let score = required(object, FIELD_MATCH)?;
    let keywords = required(object, FIELD_MISSING_KEYWORDS)?;
    let summary = required(object, FIELD_PROFILE_SUMMARY)?;

    let match_percent = match score {
        Value::String(s) => parse_match_percent(s)?,
        other => return Err(ParseError::InvalidMatchScore(other.to_string())),
    };

    let missing_keywords = keywords
        .as_array()
        .ok_or(ParseError::InvalidKeywords)?
        .iter()
        .map(|k| k.as_str().map(String::from).ok_or(ParseError::InvalidKeywords))
        .collect::<Result<Vec<_>, _>>()?;

    let profile_summary = summary
        .as_str()
        .ok_or(ParseError::InvalidSummary)?
        .to_string();

    Ok(EvaluationReport {
        match_percent,
        missing_keywords,
        profile_summary,
    })
}

fn required<'a>(object: &'a Map<String, Value>, key: &'static str) -> Result<&'a Value, ParseError> {
    object.get(key).ok_or(ParseError::MissingField(key))
}

/// Parses `"82%"` (or `"82"`) into 82. Only integers 0 – 100 are accepted.
/// Surrounding whitespace is allowed; whitespace before the `%` is not.
pub fn parse_match_percent(raw: &str) -> Result<u8, ParseError> {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed);

    number
        .parse::<i64>()
        .ok()
        .filter(|n| (0..=100).contains(n))
        .map(|n| n as u8)
        .ok_or_else(|| ParseError::InvalidMatchScore(raw.to_string()))
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(stripped) = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
    else {
        return text;
    };

    stripped
        .trim_start()
        .strip_suffix("```")
        .map(|s| s.trim())
        .unwrap_or(stripped.trim_start())
}
