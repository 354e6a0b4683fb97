mod config;
mod errors;
mod evaluation;
mod extraction;
mod llm_client;
mod routes;
mod state;
mod visualization;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::visualization::WordCloud;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Smart ATS API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the evaluation client
    let evaluator = GeminiClient::new(
        config.google_api_key.clone(),
        config.gemini_api_base.clone(),
        config.evaluation_timeout(),
    )?;
    info!(
        "Evaluation client initialized (model: {}, timeout: {}s)",
        llm_client::MODEL,
        config.evaluation_timeout_secs
    );

    // Initialize the keyword visualizer
    let word_cloud = WordCloud::new(config.word_cloud_config());
    info!(
        "Word cloud: {}x{}, seed {:?}",
        word_cloud.config().width,
        word_cloud.config().height,
        word_cloud.config().seed
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        evaluator: Arc::new(evaluator),
        visualizer: Arc::new(word_cloud),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
