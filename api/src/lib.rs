//! HTTP boundary for the product assistant.
//!
//! Routes:
//! - `GET /`       chat page
//! - `POST /get`   form field `msg` → plain-text answer
//! - `GET /health` provider probes

pub mod core;
pub mod error_handler;
mod routes;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

pub use crate::{
    core::app_state::{AppState, HealthSource},
    error_handler::{AppError, AppResult, CHAT_FAILURE_MESSAGE},
};
use crate::routes::{chat_route::chat, health_route::health, index_route::index};

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/get", post(chat))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Serves until Ctrl+C.
pub async fn start(state: AppState, address: &str) -> Result<(), AppError> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(AppError::Bind)?;
    info!(%address, "HTTP server listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("HTTP server stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
