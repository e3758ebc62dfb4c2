use axum::{extract::State, routing::post, Json, Router};

use crate::error::Result;
use crate::models::{IssueTokenRequest, IssueTokenResponse};
use crate::state::AppState;

/// Token routes
pub fn token_routes() -> Router<AppState> {
    Router::new().route("/tokens", post(issue_token))
}

/// POST /api/v1/tokens - Issue a provider entry ticket
async fn issue_token(
    State(state): State<AppState>,
    Json(request): Json<IssueTokenRequest>,
) -> Result<Json<IssueTokenResponse>> {
    let lifetime = request
        .lifetime_seconds
        .unwrap_or_else(|| state.tokens.default_lifetime_seconds());

    let token = state.tokens.issue(&request.user_id, lifetime)?;

    Ok(Json(IssueTokenResponse {
        token,
        app_id: state.tokens.app_id(),
        user_id: request.user_id,
        expires_in: lifetime,
    }))
}
