use crate::store::{KeyValueStore, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;

/// In-process store for local development (no Redis) and tests.
///
/// Not shared across instances, so the staleness check only holds within
/// one process; production deployments use [`super::RedisStore`].
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set_raw(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}
