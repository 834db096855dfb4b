//! GET /health: probes the knowledge-base host. Always answers 200; the
//! payload's `ok` flag carries the verdict.

use std::sync::Arc;

use axum::extract::State;
use qna_service::health_service::HealthStatus;

use crate::core::{app_state::AppState, http::response_envelope::ApiResponse};

pub async fn health(State(state): State<Arc<AppState>>) -> ApiResponse<HealthStatus> {
    ApiResponse::success(state.health.check(&state.endpoint).await)
}
