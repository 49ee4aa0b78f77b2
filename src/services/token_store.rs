use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("token lookup failed: {0}")]
    Lookup(String),
}

/// Source of every registered device token.
///
/// Keyed by user identity in storage, but the fan-out treats the value set
/// as one unordered batch; keys never matter here.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn all_tokens(&self) -> Result<Vec<String>, TokenStoreError>;
}

/// Token store backed by a single Redis hash: one field per user, the value
/// being that user's device token.
#[derive(Clone)]
pub struct RedisTokenStore {
    manager: ConnectionManager,
    key: String,
}

impl RedisTokenStore {
    pub async fn connect(url: &str, key: impl Into<String>) -> Result<Self, TokenStoreError> {
        let client = Client::open(url).map_err(|e| TokenStoreError::Connection(e.to_string()))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| TokenStoreError::Connection(e.to_string()))?;

        Ok(Self {
            manager,
            key: key.into(),
        })
    }
}

#[async_trait]
impl TokenStore for RedisTokenStore {
    async fn all_tokens(&self) -> Result<Vec<String>, TokenStoreError> {
        let mut conn = self.manager.clone();
        let entries: HashMap<String, String> = conn
            .hgetall(&self.key)
            .await
            .map_err(|e| TokenStoreError::Lookup(e.to_string()))?;

        Ok(entries.into_values().collect())
    }
}
