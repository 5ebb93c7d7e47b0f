mod memory;
mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serde(String),
}

/// Raw string key/value persistence. The Redis backend is shared across
/// all server instances and is the only synchronization point between
/// them; writes replace the whole value atomically.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set_raw(&self, key: &str, value: String) -> Result<(), StoreError>;
}

/// Typed JSON view over a [`KeyValueStore`].
///
/// A store outage must degrade to "always refresh", not "always crash":
/// read failures surface as a cache miss and writes are best-effort.
#[derive(Clone)]
pub struct SharedCache {
    store: Arc<dyn KeyValueStore>,
}

impl SharedCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get_raw(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("cache read failed for {key}, treating as miss: {e}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                // A record we can no longer decode is as good as absent.
                warn!("cache entry {key} failed to deserialize, treating as miss: {e}");
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("failed to serialize cache entry {key}: {e}");
                return;
            }
        };

        if let Err(e) = self.store.set_raw(key, raw).await {
            warn!("cache write failed for {key}, continuing without persisting: {e}");
        }
    }
}
