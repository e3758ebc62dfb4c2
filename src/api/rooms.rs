use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::api::require_id;
use crate::error::{AppError, Result};
use crate::models::{
    CreateRoomRequest, CreateRoomResponse, DismissRoomRequest, DismissRoomResponse,
    JoinRoomRequest, JoinRoomResponse, KickRequest, KickResponse, LeaveRoomRequest,
};
use crate::rooms::{RoomSnapshot, RoomStatus};
use crate::state::AppState;

/// Room routes
pub fn room_routes() -> Router<AppState> {
    Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/{room_id}", get(get_room))
        .route("/rooms/{room_id}/status", get(room_status))
        .route("/rooms/{room_id}/join", post(join_room))
        .route("/rooms/{room_id}/leave", post(leave_room))
        .route("/rooms/{room_id}/dismiss", post(dismiss_room))
        .route("/rooms/{room_id}/kick", post(kick_participant))
}

/// POST /api/v1/rooms - Register a room with its host
async fn create_room(
    State(state): State<AppState>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<Json<CreateRoomResponse>> {
    require_id("room_id", &request.room_id)?;
    require_id("host_id", &request.host_id)?;

    state.rooms.create(&request.room_id, &request.host_id);
    let status = state.rooms.check_status(&request.room_id);

    Ok(Json(CreateRoomResponse {
        room_id: request.room_id,
        host_id: request.host_id,
        status,
    }))
}

/// GET /api/v1/rooms/{room_id} - Host, participants and dismissal flag
async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomSnapshot>> {
    let snapshot = state
        .rooms
        .snapshot(&room_id)
        .ok_or_else(|| AppError::NotFound(format!("Room {} not found", room_id)))?;

    Ok(Json(snapshot))
}

/// GET /api/v1/rooms/{room_id}/status
async fn room_status(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Json<RoomStatus> {
    Json(state.rooms.check_status(&room_id))
}

/// POST /api/v1/rooms/{room_id}/join
async fn join_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<JoinRoomRequest>,
) -> Result<Json<JoinRoomResponse>> {
    require_id("participant_id", &request.participant_id)?;

    let joined = state.rooms.join(&room_id, &request.participant_id);

    Ok(Json(JoinRoomResponse { room_id, joined }))
}

/// POST /api/v1/rooms/{room_id}/leave
async fn leave_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<LeaveRoomRequest>,
) -> Result<Json<serde_json::Value>> {
    require_id("participant_id", &request.participant_id)?;

    state.rooms.leave(&room_id, &request.participant_id);

    Ok(Json(serde_json::json!({ "success": true })))
}

/// POST /api/v1/rooms/{room_id}/dismiss - Host ends the room for everyone
async fn dismiss_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<DismissRoomRequest>,
) -> Result<Json<DismissRoomResponse>> {
    require_id("requester_id", &request.requester_id)?;

    let dismissed = state.rooms.dismiss(&room_id, &request.requester_id);

    Ok(Json(DismissRoomResponse { room_id, dismissed }))
}

/// POST /api/v1/rooms/{room_id}/kick
async fn kick_participant(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<KickRequest>,
) -> Result<Json<KickResponse>> {
    require_id("requester_id", &request.requester_id)?;
    require_id("participant_id", &request.participant_id)?;

    let kicked = state
        .rooms
        .kick(&room_id, &request.requester_id, &request.participant_id);

    Ok(Json(KickResponse { room_id, kicked }))
}
