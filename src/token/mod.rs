pub mod wire;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::TokenError;

/// Longest user id the provider accepts, in bytes.
pub const MAX_USER_ID_LEN: usize = 64;

/// Required secret length, in bytes (AES-256 key).
pub const SECRET_LEN: usize = 32;

/// Identity claim encrypted into every ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub app_id: u32,
    pub user_id: String,
    pub nonce: i32,
    pub ctime: i64,
    pub expire: i64,
    pub payload: String,
}

/// Issues provider entry tickets ("token04").
///
/// Tickets are opaque to this service; room scoping is enforced by the
/// registry, so the claim payload is always empty.
#[derive(Clone)]
pub struct TokenIssuer {
    app_id: u32,
    secret: String,
    default_lifetime_seconds: i64,
}

impl TokenIssuer {
    pub fn new(config: &Config) -> Self {
        Self {
            app_id: config.zego_app_id,
            secret: config.zego_server_secret.clone(),
            default_lifetime_seconds: config.token_default_lifetime_seconds,
        }
    }

    pub fn with_credentials(app_id: u32, secret: impl Into<String>) -> Self {
        Self {
            app_id,
            secret: secret.into(),
            default_lifetime_seconds: 7200,
        }
    }

    pub fn app_id(&self) -> u32 {
        self.app_id
    }

    pub fn default_lifetime_seconds(&self) -> i64 {
        self.default_lifetime_seconds
    }

    /// Whether the configured credentials can issue tickets at all.
    pub fn is_configured(&self) -> bool {
        self.app_id > 0 && self.secret.len() == SECRET_LEN
    }

    /// Issue a ticket for `user_id` valid for `lifetime_seconds` from now.
    pub fn issue(&self, user_id: &str, lifetime_seconds: i64) -> Result<String, TokenError> {
        if self.app_id == 0 {
            return Err(TokenError::AppIdInvalid);
        }
        if user_id.is_empty() || user_id.len() > MAX_USER_ID_LEN {
            return Err(TokenError::UserIdInvalid);
        }
        if self.secret.len() != SECRET_LEN {
            return Err(TokenError::SecretInvalid);
        }
        if lifetime_seconds <= 0 {
            return Err(TokenError::LifetimeInvalid);
        }

        let ctime = Utc::now().timestamp();
        let expire = ctime
            .checked_add(lifetime_seconds)
            .ok_or(TokenError::LifetimeInvalid)?;

        let claims = TokenClaims {
            app_id: self.app_id,
            user_id: user_id.to_string(),
            nonce: rand::rng().random::<i32>(),
            ctime,
            expire,
            payload: String::new(),
        };
        let plaintext = serde_json::to_string(&claims).map_err(|_| TokenError::Encryption)?;

        let (nonce, ciphertext) = self.encrypt(plaintext.as_bytes())?;

        tracing::debug!(
            user_id = %user_id,
            expire = expire,
            "Provider ticket issued"
        );

        Ok(wire::pack(expire, &nonce, &ciphertext))
    }

    /// AES-256-GCM with a fresh random nonce; the tag is appended to the ciphertext.
    fn encrypt(&self, plaintext: &[u8]) -> Result<([u8; wire::NONCE_LEN], Vec<u8>), TokenError> {
        let cipher = Aes256Gcm::new_from_slice(self.secret.as_bytes())
            .map_err(|_| TokenError::SecretInvalid)?;

        let mut nonce = [0u8; wire::NONCE_LEN];
        rand::rng().fill(&mut nonce);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| TokenError::Encryption)?;

        Ok((nonce, ciphertext))
    }
}
