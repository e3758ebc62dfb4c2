use axum::{
    extract::{Path, Query, State},
    routing::post,
    Json, Router,
};

use crate::api::require_id;
use crate::error::Result;
use crate::models::{PollSignalsQuery, PollSignalsResponse, PushSignalRequest, PushSignalResponse};
use crate::state::AppState;

/// Signal routes
pub fn signal_routes() -> Router<AppState> {
    Router::new().route(
        "/rooms/{room_id}/signals",
        post(push_signal).get(poll_signals),
    )
}

/// POST /api/v1/rooms/{room_id}/signals - Host publishes a signal
async fn push_signal(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<PushSignalRequest>,
) -> Result<Json<PushSignalResponse>> {
    require_id("sender_id", &request.sender_id)?;

    let envelope = state.signals.push(
        &room_id,
        &request.sender_id,
        request.target_ids,
        request.signal,
    );

    Ok(Json(PushSignalResponse {
        accepted: envelope.is_some(),
        timestamp: envelope.map(|env| env.timestamp),
    }))
}

/// GET /api/v1/rooms/{room_id}/signals?participant_id=..&since=..
async fn poll_signals(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Query(query): Query<PollSignalsQuery>,
) -> Result<Json<PollSignalsResponse>> {
    require_id("participant_id", &query.participant_id)?;

    let signals = state
        .signals
        .poll(&room_id, &query.participant_id, query.since);
    let cursor = signals.last().map(|env| env.timestamp).or(query.since);

    Ok(Json(PollSignalsResponse { signals, cursor }))
}
