use std::sync::Arc;

use crate::config::Config;
use crate::rooms::RoomRegistry;
use crate::signal::SignalBus;
use crate::token::TokenIssuer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tokens: Arc<TokenIssuer>,
    pub rooms: Arc<RoomRegistry>,
    pub signals: Arc<SignalBus>,
}

impl AppState {
    pub fn new(config: Config, tokens: TokenIssuer, rooms: Arc<RoomRegistry>) -> Self {
        let signals = SignalBus::new(Arc::clone(&rooms), config.signal_retention);

        Self {
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            rooms,
            signals: Arc::new(signals),
        }
    }
}
