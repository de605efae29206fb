//! GET /health — provider probes.

use std::sync::Arc;

use ai_llm_service::health_service::HealthStatus;
use axum::{Json, extract::State};

use crate::core::{app_state::AppState, http::response_envelope::ApiResponse};

/// Always 200; per-provider failures are reported inside the envelope.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<HealthStatus>>> {
    Json(ApiResponse::success(state.health.check().await))
}
