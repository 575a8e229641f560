//! Redis-backed cache store.

use crate::CacheStore;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::instrument;

/// Cache store backed by a Redis server.
///
/// Uses a [`ConnectionManager`], which multiplexes commands over one
/// connection and reconnects on its own after failures. Cloning the manager
/// per command is how the redis crate expects it to be shared.
#[derive(Clone)]
pub struct RedisStore {
    name: String,
    manager: ConnectionManager,
}

impl RedisStore {
    /// Connect to the Redis server at `url` (e.g. `redis://127.0.0.1:6379`).
    ///
    /// Fails if the URL is malformed or the server can't be reached right
    /// now; callers are expected to carry on without a cache in that case.
    #[instrument("connecting to redis", skip(url))]
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).or_raise(|| ErrorKind::Connect("invalid redis url".to_string()))?;
        let manager = client
            .get_connection_manager()
            .await
            .or_raise(|| ErrorKind::Connect("redis server unreachable".to_string()))?;
        Ok(Self { name: "redis".to_string(), manager })
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.manager.clone();
        conn.get::<_, Option<String>>(key).await.or_raise(|| ErrorKind::Unavailable)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.manager.clone();
        // Redis rejects `EX 0`; sub-second TTLs round up to one second.
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds).await.or_raise(|| ErrorKind::Unavailable)
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(keys).await.or_raise(|| ErrorKind::Unavailable)
    }
}
