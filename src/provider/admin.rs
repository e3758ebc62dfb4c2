use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::Rng;
use reqwest::{Client, Url};
use serde::Deserialize;
use sha2::Sha256;

use crate::config::Config;
use crate::error::ProviderError;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_VERSION: &str = "2.0";

/// Client for the provider's server-side admin API.
#[derive(Clone)]
pub struct ProviderAdminClient {
    client: Client,
    app_id: u32,
    secret: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct AdminResponse {
    #[serde(rename = "Code")]
    code: i64,
    #[serde(rename = "Message", default)]
    message: String,
}

impl ProviderAdminClient {
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.zego_admin_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            app_id: config.zego_app_id,
            secret: config.zego_admin_secret.clone(),
            base_url: format!("https://{}/", config.zego_admin_host),
        })
    }

    pub(crate) async fn close_room_request(&self, room_id: &str) -> Result<(), ProviderError> {
        let url = self.close_room_url(room_id, &random_nonce(), Utc::now().timestamp())?;

        let res = self.client.get(url).send().await?.error_for_status()?;
        let body: AdminResponse = res.json().await?;

        if body.code != 0 {
            return Err(ProviderError::Rejected {
                code: body.code,
                message: body.message,
            });
        }

        tracing::info!(room_id = %room_id, "Provider room closed");
        Ok(())
    }

    fn close_room_url(
        &self,
        room_id: &str,
        nonce: &str,
        timestamp: i64,
    ) -> Result<Url, ProviderError> {
        let params = signed_params(self.app_id, room_id, nonce, timestamp);
        let signature = sign(&self.secret, &canonical_query(&params))?;

        let mut query: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 2);
        query.push(("Action", "CloseRoom"));
        query.extend(params.iter().map(|(k, v)| (*k, v.as_str())));
        query.push(("Signature", signature.as_str()));

        Url::parse_with_params(&self.base_url, query)
            .map_err(|e| ProviderError::Signing(format!("invalid admin host: {}", e)))
    }
}

fn signed_params(
    app_id: u32,
    room_id: &str,
    nonce: &str,
    timestamp: i64,
) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
        ("AppId", app_id.to_string()),
        ("RoomId", room_id.to_string()),
        ("SignatureNonce", nonce.to_string()),
        ("SignatureVersion", SIGNATURE_VERSION.to_string()),
        ("Timestamp", timestamp.to_string()),
    ])
}

/// `key=value` pairs in ascending key order, joined with `&`.
pub fn canonical_query(params: &BTreeMap<&str, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Hex-encoded HMAC-SHA256 of `query`.
pub fn sign(secret: &str, query: &str) -> Result<String, ProviderError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ProviderError::Signing(e.to_string()))?;
    mac.update(query.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn random_nonce() -> String {
    let mut bytes = [0u8; 8];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn client() -> ProviderAdminClient {
        ProviderAdminClient {
            client: Client::new(),
            app_id: 1279160453,
            secret: SECRET.to_string(),
            base_url: "https://rtc-api.zego.im/".to_string(),
        }
    }

    /// Serve `router` on an ephemeral port and return its base URL.
    async fn serve(router: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    #[test]
    fn test_canonical_query_is_sorted() {
        let params = signed_params(1279160453, "room1", "abcd", 1700000000);
        assert_eq!(
            canonical_query(&params),
            "AppId=1279160453&RoomId=room1&SignatureNonce=abcd&SignatureVersion=2.0&Timestamp=1700000000"
        );
    }

    #[test]
    fn test_sign_known_vector() {
        let query = "AppId=1279160453&RoomId=room1&SignatureNonce=abcd&SignatureVersion=2.0&Timestamp=1700000000";
        assert_eq!(
            sign(SECRET, query).unwrap(),
            "0e13ea2f8df22fb37288f24ca32eb2fe552996fb7a853a3d5f456b3fd627caaf"
        );
    }

    #[test]
    fn test_close_room_url() {
        let url = client()
            .close_room_url("room1", "abcd", 1700000000)
            .unwrap();

        assert_eq!(url.host_str(), Some("rtc-api.zego.im"));
        assert_eq!(
            url.query(),
            Some(
                "Action=CloseRoom&AppId=1279160453&RoomId=room1&SignatureNonce=abcd\
                 &SignatureVersion=2.0&Timestamp=1700000000\
                 &Signature=0e13ea2f8df22fb37288f24ca32eb2fe552996fb7a853a3d5f456b3fd627caaf"
            )
        );
    }

    #[test]
    fn test_random_nonce_varies() {
        assert_eq!(random_nonce().len(), 16);
        assert_ne!(random_nonce(), random_nonce());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let mut admin = client();
        admin.base_url = "http://127.0.0.1:9/".to_string();
        let result = admin.close_room_request("room1").await;
        assert!(matches!(result, Err(ProviderError::Transport(_))));
    }

    #[tokio::test]
    async fn test_http_error_status_reported_before_decoding() {
        let router = axum::Router::new().route(
            "/",
            axum::routing::get(|| async {
                (
                    axum::http::StatusCode::BAD_GATEWAY,
                    "<html>upstream unavailable</html>",
                )
            }),
        );
        let mut admin = client();
        admin.base_url = serve(router).await;

        match admin.close_room_request("room1").await {
            Err(ProviderError::Transport(e)) => {
                assert_eq!(e.status(), Some(reqwest::StatusCode::BAD_GATEWAY));
            }
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_nonzero_code_is_rejection() {
        let router = axum::Router::new().route(
            "/",
            axum::routing::get(|| async {
                axum::Json(serde_json::json!({"Code": 50001, "Message": "room not exist"}))
            }),
        );
        let mut admin = client();
        admin.base_url = serve(router).await;

        match admin.close_room_request("room1").await {
            Err(ProviderError::Rejected { code, message }) => {
                assert_eq!(code, 50001);
                assert_eq!(message, "room not exist");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_code_is_success() {
        let router = axum::Router::new().route(
            "/",
            axum::routing::get(|| async { axum::Json(serde_json::json!({"Code": 0})) }),
        );
        let mut admin = client();
        admin.base_url = serve(router).await;

        assert!(admin.close_room_request("room1").await.is_ok());
    }
}
