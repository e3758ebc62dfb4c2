use serde::{Deserialize, Serialize};

/// Request for a provider entry ticket
#[derive(Debug, Deserialize)]
pub struct IssueTokenRequest {
    pub user_id: String,
    /// Falls back to the configured default lifetime
    #[serde(default)]
    pub lifetime_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct IssueTokenResponse {
    pub token: String,
    pub app_id: u32,
    pub user_id: String,
    pub expires_in: i64,
}
