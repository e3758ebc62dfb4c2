use serde::{Deserialize, Serialize};

use crate::signal::{Signal, SignalEnvelope};

/// Host request to publish a teleprompter / remote-control signal
#[derive(Debug, Deserialize)]
pub struct PushSignalRequest {
    pub sender_id: String,
    /// Participant ids, or `["all"]`. Empty addresses everyone.
    #[serde(default)]
    pub target_ids: Vec<String>,
    pub signal: Signal,
}

#[derive(Debug, Serialize)]
pub struct PushSignalResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PollSignalsQuery {
    pub participant_id: String,
    #[serde(default)]
    pub since: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PollSignalsResponse {
    pub signals: Vec<SignalEnvelope>,
    /// Pass back as `since` on the next poll
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<i64>,
}
