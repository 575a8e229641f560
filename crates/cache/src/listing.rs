use crate::StoreHandle;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Long enough to absorb a burst of page requests, short enough that edits
/// made behind the server's back show up quickly.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);
const KEY_PREFIX: &str = "ig:images:v2:";

/// Directory keys from the root down to `dir`, each a prefix of the next.
///
/// ```
/// use gallery_cache::ancestor_chain;
/// assert_eq!(ancestor_chain("a/b/c"), vec!["", "a", "a/b", "a/b/c"]);
/// assert_eq!(ancestor_chain(""), vec![""]);
/// ```
pub fn ancestor_chain(dir: &str) -> Vec<String> {
    let mut chain = vec![String::new()];
    let mut current = String::new();
    for part in dir.split('/').filter(|p| !p.is_empty()) {
        if !current.is_empty() {
            current.push('/');
        }
        current.push_str(part);
        chain.push(current.clone());
    }
    chain
}

/// Typed, best-effort cache of directory listings.
///
/// Values are stored as JSON under `ig:images:v2:<dir>`. None of the public
/// methods fail: a store error is logged and reported as a miss (or ignored,
/// for writes). Without a store every lookup misses.
#[derive(Clone)]
pub struct ListingCache {
    store: Option<StoreHandle>,
    ttl: Duration,
}

impl ListingCache {
    pub fn new(store: Option<StoreHandle>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self::new(None, DEFAULT_TTL)
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn key(dir: &str) -> String {
        format!("{KEY_PREFIX}{dir}")
    }

    pub async fn get<T: DeserializeOwned>(&self, dir: &str) -> Option<T> {
        let store = self.store.as_ref()?;
        match Self::try_get(store, dir).await {
            Ok(hit) => hit,
            Err(err) => {
                tracing::warn!(store = store.name(), dir, error = ?err, "Listing cache read failed; treating as miss");
                None
            },
        }
    }

    pub async fn set<T: Serialize>(&self, dir: &str, value: &T) {
        let Some(store) = self.store.as_ref() else { return };
        if let Err(err) = Self::try_set(store, dir, value, self.ttl).await {
            tracing::warn!(store = store.name(), dir, error = ?err, "Listing cache write failed");
        }
    }

    /// Drop cached listings for `dir` and every ancestor of it.
    ///
    /// Siblings and descendants of `dir` are left alone; their entries age
    /// out with the TTL.
    pub async fn invalidate(&self, dir: &str) {
        let Some(store) = self.store.as_ref() else { return };
        let keys: Vec<String> = ancestor_chain(dir).iter().map(|d| Self::key(d)).collect();
        match store.delete(&keys).await {
            Ok(()) => tracing::debug!(store = store.name(), dir, keys = keys.len(), "Invalidated cached listings"),
            Err(err) => tracing::warn!(store = store.name(), dir, error = ?err, "Listing cache invalidation failed"),
        }
    }

    async fn try_get<T: DeserializeOwned>(store: &StoreHandle, dir: &str) -> Result<Option<T>> {
        let Some(raw) = store.get(&Self::key(dir)).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw).or_raise(|| ErrorKind::InvalidData)?))
    }

    async fn try_set<T: Serialize>(store: &StoreHandle, dir: &str, value: &T, ttl: Duration) -> Result<()> {
        let raw = serde_json::to_string(value).or_raise(|| ErrorKind::InvalidData)?;
        store.set(&Self::key(dir), &raw, ttl).await
    }
}
