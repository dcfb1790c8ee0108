use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::api::MapAPI;

/// Process-local cache, forgotten on exit.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryCache {
    fn with_entries<T>(
        &self,
        f: impl FnOnce(&mut HashMap<(String, String), Vec<u8>>) -> T,
    ) -> Result<T> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory cache lock poisoned"))?;
        Ok(f(&mut entries))
    }
}

#[async_trait]
impl MapAPI for MemoryCache {
    fn new() -> Self {
        MemoryCache::default()
    }

    async fn get(&self, pool: &str, key: &str) -> Result<Option<Vec<u8>>> {
        self.with_entries(|e| e.get(&(pool.to_string(), key.to_string())).cloned())
    }

    async fn set(&self, pool: &str, key: &str, data: &[u8]) -> Result<()> {
        self.with_entries(|e| {
            e.insert((pool.to_string(), key.to_string()), data.to_vec());
        })
    }

    async fn has(&self, pool: &str, key: &str) -> Result<bool> {
        self.with_entries(|e| e.contains_key(&(pool.to_string(), key.to_string())))
    }

    async fn delete(&self, pool: &str, key: &str) -> Result<()> {
        self.with_entries(|e| {
            e.remove(&(pool.to_string(), key.to_string()));
        })
    }
}
