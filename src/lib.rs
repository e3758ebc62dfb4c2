pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod provider;
pub mod rooms;
pub mod signal;
pub mod state;
pub mod token;
pub mod ws;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
