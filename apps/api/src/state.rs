use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::EvaluationClient;
use crate::visualization::KeywordVisualizer;

/// Shared application state injected into all route handlers via Axum extractors.
/// Immutable after startup; evaluations share nothing else.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Default: `GeminiClient`. Tests inject a mock.
    pub evaluator: Arc<dyn EvaluationClient>,
    pub visualizer: Arc<dyn KeywordVisualizer>,
}
