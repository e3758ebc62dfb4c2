pub mod admin;

pub use admin::ProviderAdminClient;

use async_trait::async_trait;

use crate::error::ProviderError;

/// Transport-level room shutdown at the conferencing provider.
///
/// The registry only calls this after it has already dismissed a room locally,
/// so implementations report failure and never retry.
#[async_trait]
pub trait RoomCloser: Send + Sync {
    async fn close_room(&self, room_id: &str) -> Result<(), ProviderError>;
}

#[async_trait]
impl RoomCloser for ProviderAdminClient {
    async fn close_room(&self, room_id: &str) -> Result<(), ProviderError> {
        self.close_room_request(room_id).await
    }
}
