use serde::Serialize;

use crate::signal::SignalEnvelope;

/// Frames pushed to live signal subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Signal(SignalEnvelope),
    /// The room was dismissed or evicted; no more frames follow
    RoomClosed { room_id: String },
}
