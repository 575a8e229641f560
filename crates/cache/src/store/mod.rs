//! Key-value stores backing the cache.

pub(crate) mod memory;
#[cfg(feature = "redis")]
pub(crate) mod redis;

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub type StoreHandle = Arc<dyn CacheStore + Send + Sync>;

/// Minimal string key-value interface with per-key expiry.
///
/// Each operation is atomic for the keys it touches; nothing more is
/// promised. Implementations are free to evict entries early.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Name of the store (used for logging only).
    fn name(&self) -> &str;

    /// Fetch a value, or `None` if it is absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value that expires after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Remove every listed key. Missing keys are ignored.
    async fn delete(&self, keys: &[String]) -> Result<()>;
}
