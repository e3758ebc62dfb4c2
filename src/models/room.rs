use serde::{Deserialize, Serialize};

use crate::rooms::RoomStatus;

/// Request to register a room (host path)
#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub room_id: String,
    pub host_id: String,
}

/// Response after registering a room
#[derive(Debug, Serialize)]
pub struct CreateRoomResponse {
    pub room_id: String,
    pub host_id: String,
    pub status: RoomStatus,
}

/// Request to join a room (guest path)
#[derive(Debug, Deserialize)]
pub struct JoinRoomRequest {
    pub participant_id: String,
}

#[derive(Debug, Serialize)]
pub struct JoinRoomResponse {
    pub room_id: String,
    pub joined: bool,
}

#[derive(Debug, Deserialize)]
pub struct LeaveRoomRequest {
    pub participant_id: String,
}

#[derive(Debug, Deserialize)]
pub struct DismissRoomRequest {
    pub requester_id: String,
}

#[derive(Debug, Serialize)]
pub struct DismissRoomResponse {
    pub room_id: String,
    pub dismissed: bool,
}

/// Host request to remove a participant
#[derive(Debug, Deserialize)]
pub struct KickRequest {
    pub requester_id: String,
    pub participant_id: String,
}

#[derive(Debug, Serialize)]
pub struct KickResponse {
    pub room_id: String,
    pub kicked: bool,
}
