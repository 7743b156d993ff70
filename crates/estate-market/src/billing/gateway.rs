//! Paystack integration: outbound transaction calls and inbound webhook
//! signature checks.

use std::collections::BTreeMap;
use std::fmt::Debug;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use tracing::{info, warn};

use crate::config::PaystackConfig;

type HmacSha512 = Hmac<Sha512>;

/// Header carrying the hex HMAC-SHA512 of a webhook body.
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitializeRequest {
    pub email: String,
    /// Minor units (kobo).
    pub amount: u64,
    pub callback_url: String,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InitializedTransaction {
    #[serde(default)]
    pub authorization_url: Option<String>,
    #[serde(default)]
    pub access_code: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerifiedTransaction {
    pub reference: String,
    pub status: String,
    /// Minor units (kobo).
    pub amount: u64,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl VerifiedTransaction {
    pub fn metadata_str(&self, key: &str) -> Option<String> {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.get(key))
            .and_then(|value| value.as_str())
            .map(str::to_string)
    }
}

/// Outbound payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync + Debug {
    async fn initialize(
        &self,
        request: InitializeRequest,
    ) -> Result<InitializedTransaction, GatewayError>;
    async fn verify(&self, reference: &str) -> Result<VerifiedTransaction, GatewayError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("network error contacting payment gateway: {0}")]
    Network(String),
    #[error("payment gateway rejected the request: {0}")]
    Rejected(String),
    #[error("payment gateway response missing {0}")]
    MissingField(&'static str),
    #[error("invalid payment gateway response: {0}")]
    Decode(String),
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    message: Option<String>,
    data: Option<T>,
}

/// reqwest-backed Paystack client.
#[derive(Debug, Clone)]
pub struct PaystackClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl PaystackClient {
    pub fn new(config: &PaystackConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| GatewayError::Network(err.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }

    /// Join path segments onto the base url, escaping each one.
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, GatewayError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|err| GatewayError::Rejected(format!("invalid base url: {err}")))?;
        url.path_segments_mut()
            .map_err(|()| GatewayError::Rejected("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read<T>(&self, response: reqwest::Response) -> Result<T, GatewayError>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|err| GatewayError::Decode(err.to_string()))?;
        if !status.is_success() || !envelope.status {
            let message = envelope
                .message
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            warn!(%status, %message, "paystack call failed");
            return Err(GatewayError::Rejected(message));
        }
        envelope.data.ok_or(GatewayError::MissingField("data"))
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn initialize(
        &self,
        request: InitializeRequest,
    ) -> Result<InitializedTransaction, GatewayError> {
        info!(email = %request.email, amount = request.amount, "initializing paystack transaction");
        let response = self
            .http
            .post(self.endpoint(&["transaction", "initialize"])?)
            .bearer_auth(&self.secret_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| GatewayError::Network(err.to_string()))?;
        self.read(response).await
    }

    async fn verify(&self, reference: &str) -> Result<VerifiedTransaction, GatewayError> {
        info!(%reference, "verifying paystack transaction");
        let response = self
            .http
            .get(self.endpoint(&["transaction", "verify", reference])?)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|err| GatewayError::Network(err.to_string()))?;
        self.read(response).await
    }
}

/// Constant-time check of a hex HMAC-SHA512 signature over `body`.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha512::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Hex HMAC-SHA512 of `body`, as the gateway would sign it.
pub fn sign(secret: &str, body: &[u8]) -> String {
    match HmacSha512::new_from_slice(secret.as_bytes()) {
        Ok(mut mac) => {
            mac.update(body);
            hex::encode(mac.finalize().into_bytes())
        }
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signatures_verify_against_the_same_secret_only() {
        let body = br#"{"event":"charge.success"}"#;
        let signature = sign("sk_test", body);
        assert_eq!(signature.len(), 128);
        assert!(verify_signature("sk_test", body, &signature));
        assert!(verify_signature("sk_test", body, &signature.to_uppercase()));
        assert!(!verify_signature("sk_other", body, &signature));
        assert!(!verify_signature("sk_test", b"tampered", &signature));
    }

    #[test]
    fn malformed_signatures_are_rejected() {
        assert!(!verify_signature("sk_test", b"{}", "not-hex"));
        assert!(!verify_signature("sk_test", b"{}", ""));
    }

    fn client(base_url: &str) -> PaystackClient {
        PaystackClient::new(&PaystackConfig {
            secret_key: "sk_test".to_string(),
            base_url: base_url.to_string(),
            timeout: std::time::Duration::from_secs(1),
            callback_url: "http://localhost:3000/api/v1/subscriptions/verify".to_string(),
        })
        .expect("client builds")
    }

    #[test]
    fn references_are_escaped_into_a_single_path_segment() {
        let url = client("https://api.paystack.test/")
            .endpoint(&["transaction", "verify", "../refund/1?x=y"])
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://api.paystack.test/transaction/verify/..%2Frefund%2F1%3Fx=y"
        );
        assert_eq!(url.query(), None);
    }

    #[test]
    fn nested_base_urls_keep_their_prefix() {
        let url = client("https://gateway.test/paystack")
            .endpoint(&["transaction", "initialize"])
            .expect("url");
        assert_eq!(url.as_str(), "https://gateway.test/paystack/transaction/initialize");
    }

    #[test]
    fn envelopes_without_data_decode_as_empty() {
        let envelope: Envelope<VerifiedTransaction> = serde_json::from_value(serde_json::json!({
            "status": false,
            "message": "Invalid key"
        }))
        .expect("decodes");
        assert!(!envelope.status);
        assert_eq!(envelope.message.as_deref(), Some("Invalid key"));
        assert!(envelope.data.is_none());
    }

    #[test]
    fn verified_metadata_is_read_as_strings() {
        let transaction: VerifiedTransaction = serde_json::from_value(serde_json::json!({
            "reference": "ref-1",
            "status": "success",
            "amount": 500000,
            "metadata": {"plan": "premium", "agent_id": 7}
        }))
        .expect("decodes");
        assert_eq!(transaction.metadata_str("plan").as_deref(), Some("premium"));
        assert_eq!(transaction.metadata_str("agent_id"), None);
    }
}
