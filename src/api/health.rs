use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::error::Result;
use crate::state::AppState;

/// Health response structure
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub token_issuer: String,
    pub rooms: usize,
    pub signal_queues: usize,
    pub timestamp: String,
}

/// Health routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// GET /health - Health check endpoint
async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    let issuer_status = if state.tokens.is_configured() {
        "ready"
    } else {
        "misconfigured"
    };

    let overall_status = if issuer_status == "ready" {
        "healthy"
    } else {
        "unhealthy"
    };

    Ok(Json(HealthResponse {
        status: overall_status.to_string(),
        token_issuer: issuer_status.to_string(),
        rooms: state.rooms.room_count(),
        signal_queues: state.signals.queue_count(),
        timestamp: Utc::now().to_rfc3339(),
    }))
}
