use std::sync::Arc;
use std::time::Duration;

use super::gateway::{MulticastReport, PushGateway};
use crate::error::{AppError, AppResult};

/// Result of one relay attempt.
#[derive(Debug, Clone)]
pub enum RelayOutcome {
    /// Empty token batch; the gateway was never invoked.
    NoRecipients,
    Sent(MulticastReport),
}

/// Hands one batch of device tokens to the push gateway.
///
/// The gateway is optional: a deployment without credentials still serves the
/// live-connection surface, and relay attempts fail cleanly instead of at
/// startup.
#[derive(Clone)]
pub struct PushRelay {
    gateway: Option<Arc<dyn PushGateway>>,
    timeout: Duration,
}

impl PushRelay {
    pub fn new(gateway: Option<Arc<dyn PushGateway>>, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }

    pub fn is_configured(&self) -> bool {
        self.gateway.is_some()
    }

    /// Invokes the gateway exactly once with the full batch; no retry, no
    /// filtering of failed tokens. An empty batch short-circuits before
    /// anything else: the gateway rejects zero-target calls.
    pub async fn relay(
        &self,
        title: &str,
        body: &str,
        tokens: &[String],
    ) -> AppResult<RelayOutcome> {
        if tokens.is_empty() {
            tracing::debug!("no device tokens registered, skipping gateway");
            return Ok(RelayOutcome::NoRecipients);
        }

        let gateway = self
            .gateway
            .as_ref()
            .ok_or_else(|| AppError::Gateway("push gateway not configured".into()))?;

        let report = tokio::time::timeout(self.timeout, gateway.send_multicast(tokens, title, body))
            .await
            .map_err(|_| AppError::Gateway(format!("gateway timed out after {:?}", self.timeout)))??;

        tracing::info!(
            "relayed notification to {} tokens: {} ok, {} failed",
            tokens.len(),
            report.success_count,
            report.failure_count
        );
        Ok(RelayOutcome::Sent(report))
    }
}
