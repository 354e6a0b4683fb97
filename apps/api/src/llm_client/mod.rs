/// LLM Client: the single point of entry for all generative-language calls.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// The evaluation pipeline only sees the `EvaluationClient` trait, so tests
/// substitute a mock and never touch the network.
///
/// Model: gemini-1.5-flash (hardcoded, not configurable)
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::evaluation::request::EvaluationRequest;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
/// The model used for every evaluation.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Prompt blocked by the service: {0}")]
    Blocked(String),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// The boundary to the external evaluation service: one prompt in, raw text out.
///
/// Carried in `AppState` as `Arc<dyn EvaluationClient>`. No retries happen
/// behind this trait; a failure is terminal for that evaluation.
#[async_trait]
pub trait EvaluationClient: Send + Sync {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types (generateContent)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// GeminiClient
// ────────────────────────────────────────────────────────────────────────────

/// Production `EvaluationClient` backed by the Gemini generateContent API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    api_base: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(api_key: String, api_base: String, timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{MODEL}:generateContent", self.api_base)
    }

    /// Makes a single call to the model, returning the full response object.
    pub async fn call(&self, prompt: &str) -> Result<GenerateContentResponse, LlmError> {
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.classify_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!("Gemini API returned {}: {}", status, message);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| self.classify_transport_error(e))?;

        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "LLM call succeeded: prompt_tokens={}, candidate_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        Ok(parsed)
    }

    fn classify_transport_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.timeout.as_secs())
        } else {
            LlmError::Http(e)
        }
    }
}

#[async_trait]
impl EvaluationClient for GeminiClient {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<String, LlmError> {
        let response = self.call(&request.prompt).await?;
        extract_candidate_text(response)
    }
}

fn extract_candidate_text(response: GenerateContentResponse) -> Result<String, LlmError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.clone())
    {
        return Err(LlmError::Blocked(reason));
    }

    match response.text() {
        Some(text) => Ok(text),
        None => {
            let finish_reason = response
                .candidates
                .first()
                .and_then(|c| c.finish_reason.as_deref())
                .unwrap_or("none");
            warn!("Gemini returned no text (finish_reason={finish_reason})");
            Err(LlmError::EmptyContent)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn parse(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: "hello" }],
            }],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_candidate_text_concatenates_parts() {
        let response = parse(
            r#"{
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "{\"JD Match\""}, {"text": ": \"80%\"}"}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 40, "totalTokenCount": 160}
            }"#,
        );
        assert_eq!(
            extract_candidate_text(response).unwrap(),
            r#"{"JD Match": "80%"}"#
        );
    }

    #[test]
    fn test_blocked_prompt_is_error() {
        let response = parse(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#);
        assert!(matches!(
            extract_candidate_text(response),
            Err(LlmError::Blocked(reason)) if reason == "SAFETY"
        ));
    }

    #[test]
    fn test_missing_candidates_is_empty_content() {
        let response = parse(r#"{"candidates": []}"#);
        assert!(matches!(
            extract_candidate_text(response),
            Err(LlmError::EmptyContent)
        ));
    }

    #[test]
    fn test_whitespace_only_candidate_is_empty_content() {
        let response = parse(
            r#"{"candidates": [{"content": {"parts": [{"text": "  \n"}]}, "finishReason": "MAX_TOKENS"}]}"#,
        );
        assert!(matches!(
            extract_candidate_text(response),
            Err(LlmError::EmptyContent)
        ));
    }

    #[test]
    fn test_endpoint_uses_hardcoded_model() {
        let client = GeminiClient::new(
            "key".to_string(),
            "http://localhost:9999/".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let client = GeminiClient::new(
            "key".to_string(),
            "http://127.0.0.1:9".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        let request = crate::evaluation::request::build("resume", "jd");
        let err = client.evaluate(&request).await.unwrap_err();
        assert!(matches!(err, LlmError::Http(_) | LlmError::Timeout(_)));
    }

    /// Reads one HTTP request: headers plus `Content-Length` bytes of body.
    async fn read_request(stream: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);

            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let headers = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let body_len = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                return;
            }
        }
    }

    /// Serves a single connection on an ephemeral local port.
    async fn serve_once<F, Fut>(handle: F) -> String
    where
        F: FnOnce(TcpStream) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            handle(stream).await;
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_slow_service_is_timeout() {
        let base = serve_once(|mut stream| async move {
            read_request(&mut stream).await;
            // Hold the connection open without answering.
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(stream);
        })
        .await;

        let client = GeminiClient::new("key".to_string(), base, Duration::from_secs(1)).unwrap();
        let request = crate::evaluation::request::build("resume", "jd");
        let err = client.evaluate(&request).await.unwrap_err();

        assert!(matches!(err, LlmError::Timeout(1)), "got {err:?}");
        assert_eq!(err.to_string(), "Request timed out after 1s");
    }

    #[tokio::test]
    async fn test_error_status_carries_service_message() {
        let base = serve_once(|mut stream| async move {
            read_request(&mut stream).await;
            let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
            let response = format!(
                "HTTP/1.1 400 Bad Request\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        })
        .await;

        let client = GeminiClient::new("bad-key".to_string(), base, Duration::from_secs(5)).unwrap();
        let request = crate::evaluation::request::build("resume", "jd");
        let err = client.evaluate(&request).await.unwrap_err();

        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_error_body_is_passed_through() {
        let base = serve_once(|mut stream| async move {
            read_request(&mut stream).await;
            let body = "upstream overloaded";
            let response = format!(
                "HTTP/1.1 503 Service Unavailable\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        })
        .await;

        let client = GeminiClient::new("key".to_string(), base, Duration::from_secs(5)).unwrap();
        let err = client.call("hello").await.unwrap_err();

        assert!(matches!(
            err,
            LlmError::Api { status: 503, ref message } if message == "upstream overloaded"
        ));
    }
}
