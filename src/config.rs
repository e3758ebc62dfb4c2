use std::env;
use std::time::Duration;

use crate::signal::DEFAULT_RETENTION;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub zego_app_id: u32,
    pub zego_server_secret: String,
    pub zego_admin_secret: String,
    pub zego_admin_host: String,
    pub zego_admin_timeout_seconds: u64,
    pub token_default_lifetime_seconds: i64,
    pub room_idle_timeout_seconds: u64,
    pub room_cleanup_interval_seconds: u64,
    pub room_dismiss_grace_seconds: u64,
    pub signal_retention: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let zego_app_id = env::var("ZEGO_APP_ID")
            .map_err(|_| ConfigError::MissingAppId)?
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidAppId)?;
        let zego_server_secret =
            env::var("ZEGO_SERVER_SECRET").map_err(|_| ConfigError::MissingServerSecret)?;

        let config = Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            zego_app_id,
            zego_admin_secret: env::var("ZEGO_ADMIN_SECRET")
                .unwrap_or_else(|_| zego_server_secret.clone()),
            zego_server_secret,
            zego_admin_host: env::var("ZEGO_ADMIN_HOST")
                .unwrap_or_else(|_| "rtc-api.zego.im".to_string()),
            zego_admin_timeout_seconds: parse_or("ZEGO_ADMIN_TIMEOUT_SECONDS", 5),
            token_default_lifetime_seconds: parse_or("TOKEN_DEFAULT_LIFETIME_SECONDS", 7200),
            room_idle_timeout_seconds: parse_or("ROOM_IDLE_TIMEOUT_SECONDS", 600),
            room_cleanup_interval_seconds: parse_or("ROOM_CLEANUP_INTERVAL_SECONDS", 60),
            room_dismiss_grace_seconds: parse_or("ROOM_DISMISS_GRACE_SECONDS", 5),
            signal_retention: parse_or("SIGNAL_RETENTION", DEFAULT_RETENTION),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject periods that would stall background work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.room_cleanup_interval_seconds == 0 {
            return Err(ConfigError::InvalidCleanupInterval);
        }
        if self.room_idle_timeout_seconds == 0 {
            return Err(ConfigError::InvalidIdleTimeout);
        }
        if self.zego_admin_timeout_seconds == 0 {
            return Err(ConfigError::InvalidAdminTimeout);
        }
        Ok(())
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.room_idle_timeout_seconds)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.room_cleanup_interval_seconds)
    }

    pub fn dismiss_grace(&self) -> Duration {
        Duration::from_secs(self.room_dismiss_grace_seconds)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server port")]
    InvalidPort,
    #[error("ZEGO_APP_ID environment variable is required")]
    MissingAppId,
    #[error("ZEGO_APP_ID must be an unsigned integer")]
    InvalidAppId,
    #[error("ZEGO_SERVER_SECRET environment variable is required")]
    MissingServerSecret,
    #[error("ROOM_CLEANUP_INTERVAL_SECONDS must be greater than zero")]
    InvalidCleanupInterval,
    #[error("ROOM_IDLE_TIMEOUT_SECONDS must be greater than zero")]
    InvalidIdleTimeout,
    #[error("ZEGO_ADMIN_TIMEOUT_SECONDS must be greater than zero")]
    InvalidAdminTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            zego_app_id: 1279160453,
            zego_server_secret: "e18cc600e2939d412c48f152e157f01d".to_string(),
            zego_admin_secret: "e18cc600e2939d412c48f152e157f01d".to_string(),
            zego_admin_host: "rtc-api.zego.im".to_string(),
            zego_admin_timeout_seconds: 5,
            token_default_lifetime_seconds: 7200,
            room_idle_timeout_seconds: 600,
            room_cleanup_interval_seconds: 60,
            room_dismiss_grace_seconds: 5,
            signal_retention: DEFAULT_RETENTION,
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(config().validate().is_ok());
        assert_eq!(config().server_addr(), "127.0.0.1:8080");
        assert_eq!(config().cleanup_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_zero_periods_rejected() {
        let mut zero_interval = config();
        zero_interval.room_cleanup_interval_seconds = 0;
        assert!(matches!(
            zero_interval.validate(),
            Err(ConfigError::InvalidCleanupInterval)
        ));

        let mut zero_idle = config();
        zero_idle.room_idle_timeout_seconds = 0;
        assert!(matches!(
            zero_idle.validate(),
            Err(ConfigError::InvalidIdleTimeout)
        ));

        let mut zero_admin = config();
        zero_admin.zego_admin_timeout_seconds = 0;
        assert!(matches!(
            zero_admin.validate(),
            Err(ConfigError::InvalidAdminTimeout)
        ));
    }

    #[test]
    fn test_zero_grace_allowed() {
        let mut immediate = config();
        immediate.room_dismiss_grace_seconds = 0;
        assert!(immediate.validate().is_ok());
    }
}
