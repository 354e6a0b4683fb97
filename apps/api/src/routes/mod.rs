pub mod health;

use std::any::Any;

use axum::{
    extract::DefaultBodyLimit,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;

use crate::errors::AppError;
use crate::evaluation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Evaluation API
        .route(
            "/api/v1/evaluations",
            post(handlers::handle_evaluate).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
}

/// A panicking handler answers with the standard 500 envelope instead of
/// dropping the connection.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());

    AppError::Internal(anyhow::anyhow!("request handler panicked: {detail}")).into_response()
}
