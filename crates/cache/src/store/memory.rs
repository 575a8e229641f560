//! In-process cache store.

use crate::CacheStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Source of "now" for expiry checks, swappable in tests.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Cache store living in the server process.
///
/// Entries are kept in a `HashMap` behind a [`RwLock`] together with their
/// expiry instant. Expired entries are invisible to [`get`](CacheStore::get)
/// and swept on the next [`set`](CacheStore::set).
pub struct MemoryStore {
    name: String,
    entries: RwLock<HashMap<String, (Instant, String)>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            name: "memory".to_string(),
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of entries held, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = self.clock.now();
        let guard = self.entries.read().await;
        Ok(guard.get(key).filter(|(expires, _)| *expires > now).map(|(_, value)| value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let now = self.clock.now();
        let mut guard = self.entries.write().await;
        guard.retain(|_, (expires, _)| *expires > now);
        guard.insert(key.to_string(), (now + ttl, value.to_string()));
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        let mut guard = self.entries.write().await;
        for key in keys {
            guard.remove(key);
        }
        Ok(())
    }
}
