pub mod health;
pub mod rooms;
pub mod signals;
pub mod tokens;

use axum::Router;

use crate::state::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        .merge(health::health_routes())
        .with_state(state)
}

/// API v1 routes
fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(tokens::token_routes())
        .merge(rooms::room_routes())
        .merge(signals::signal_routes())
}

/// Reject empty or oversized identifiers.
pub(crate) fn require_id(field: &str, value: &str) -> crate::Result<()> {
    if value.trim().is_empty() {
        return Err(crate::AppError::BadRequest(format!("{} is required", field)));
    }
    if value.len() > 128 {
        return Err(crate::AppError::BadRequest(format!(
            "{} must be at most 128 bytes",
            field
        )));
    }
    Ok(())
}
