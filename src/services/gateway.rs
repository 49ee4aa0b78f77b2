use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-token outcome of a multicast push.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushReceipt {
    pub token: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PushReceipt {
    pub fn delivered(token: impl Into<String>, message_id: Option<String>) -> Self {
        Self {
            token: token.into(),
            success: true,
            message_id,
            error: None,
        }
    }

    pub fn rejected(token: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

/// Aggregated result of one multicast call: which tokens the gateway accepted
/// and which it rejected. Rejected tokens are reported, never retried.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MulticastReport {
    pub success_count: usize,
    pub failure_count: usize,
    pub receipts: Vec<PushReceipt>,
}

impl MulticastReport {
    pub fn record(&mut self, receipt: PushReceipt) {
        if receipt.success {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
        self.receipts.push(receipt);
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("credentials error: {0}")]
    Credentials(String),

    #[error("jwt signing error: {0}")]
    Jwt(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("send request failed: {0}")]
    Request(String),

    #[error("gateway api error ({0}): {1}")]
    Api(String, String),

    #[error("unexpected gateway response: {0}")]
    ResponseParse(String),
}

/// External push gateway able to address many device tokens in one call.
///
/// Callers hand over the full batch exactly once per request; how the
/// implementation fans the batch out to its provider is its own business.
/// A request-level failure (auth, network) is an error; a rejected token is
/// a failed receipt inside an `Ok` report.
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send_multicast(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
    ) -> Result<MulticastReport, GatewayError>;
}
