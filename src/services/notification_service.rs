use std::sync::Arc;
use std::time::Duration;

use super::relay::{PushRelay, RelayOutcome};
use super::token_store::TokenStore;
use crate::error::{AppError, AppResult};
use crate::models::Notification;
use crate::websocket::{BroadcastDispatcher, BroadcastReport, NotificationFrame};

/// Combined result of the full send pipeline.
#[derive(Debug, Clone)]
pub struct SendReport {
    pub relay: RelayOutcome,
    pub broadcast: BroadcastReport,
}

/// Orchestrates the send pipeline: validate, look up device tokens, relay to
/// the push gateway, then fan out to live connections.
pub struct NotificationService {
    token_store: Arc<dyn TokenStore>,
    relay: PushRelay,
    dispatcher: BroadcastDispatcher,
    token_store_timeout: Duration,
}

impl NotificationService {
    pub fn new(
        token_store: Arc<dyn TokenStore>,
        relay: PushRelay,
        dispatcher: BroadcastDispatcher,
        token_store_timeout: Duration,
    ) -> Self {
        Self {
            token_store,
            relay,
            dispatcher,
            token_store_timeout,
        }
    }

    /// Full pipeline. Stops at the first failing stage: a validation or
    /// token-store error means the gateway is never called, and a gateway
    /// error means live connections see nothing.
    pub async fn send(&self, notification: &Notification) -> AppResult<SendReport> {
        notification.validate()?;

        let tokens = self.fetch_tokens().await?;
        let relay = self
            .relay
            .relay(&notification.title, &notification.body, &tokens)
            .await?;
        let broadcast = self.broadcast(notification).await?;

        Ok(SendReport { relay, broadcast })
    }

    /// Fan-out only, no token lookup and no gateway. Accepts whatever payload
    /// it is given; there is nothing to validate against.
    pub async fn broadcast_only(&self, notification: &Notification) -> AppResult<BroadcastReport> {
        self.broadcast(notification).await
    }

    async fn fetch_tokens(&self) -> AppResult<Vec<String>> {
        let tokens = tokio::time::timeout(self.token_store_timeout, self.token_store.all_tokens())
            .await
            .map_err(|_| {
                AppError::TokenStore(format!(
                    "token lookup timed out after {:?}",
                    self.token_store_timeout
                ))
            })??;
        tracing::debug!("fetched {} device tokens", tokens.len());
        Ok(tokens)
    }

    async fn broadcast(&self, notification: &Notification) -> AppResult<BroadcastReport> {
        let payload = NotificationFrame::from(notification)
            .to_json()
            .map_err(|e| AppError::Internal(format!("frame serialization: {}", e)))?;
        Ok(self.dispatcher.broadcast(&payload).await)
    }
}
