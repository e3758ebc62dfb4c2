use serde::{Deserialize, Serialize};

/// Target id addressing every participant of a room.
pub const ALL_TARGETS: &str = "all";

/// Host-authored instruction for participants' clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    /// Replace the teleprompter text
    TeleprompterContent {
        content: String,
        #[serde(default = "default_scroll_speed")]
        scroll_speed: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_height: Option<String>,
    },
    TeleprompterControl {
        action: PlaybackAction,
    },
    /// Toggle a participant's capture/playback device
    RemoteControl {
        action: DeviceAction,
        device: Device,
    },
}

fn default_scroll_speed() -> u32 {
    50
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaybackAction {
    Play,
    Pause,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceAction {
    Enable,
    Disable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Device {
    Camera,
    Microphone,
    Speaker,
}

/// A signal as stored and delivered, stamped by the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalEnvelope {
    /// Milliseconds since the Unix epoch, strictly increasing per room
    pub timestamp: i64,
    pub sender_id: String,
    pub target_ids: Vec<String>,
    pub signal: Signal,
}

impl SignalEnvelope {
    /// An empty target list or the `"all"` wildcard addresses everyone.
    pub fn is_addressed_to(&self, participant_id: &str) -> bool {
        self.target_ids.is_empty()
            || self
                .target_ids
                .iter()
                .any(|t| t == ALL_TARGETS || t == participant_id)
    }
}
