//! Like counters persisted to a single JSON file.
//!
//! Likes are best-effort: an unreadable file counts as empty and a failed
//! write is logged, neither fails the request. The file is only re-parsed
//! when its modification time changes. An increment rewrites only its own
//! entry; everything else in the file is written back as it was read.

use serde_json::Value;
use std::collections::BTreeMap;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Snapshot {
    entries: BTreeMap<String, Value>,
    modified: Option<SystemTime>,
}

/// Like counters keyed by like id (see [`like_id`](crate::like_id)).
#[derive(Debug)]
pub struct LikeStore {
    path: PathBuf,
    // Held across the whole read-modify-write of an increment.
    snapshot: Mutex<Snapshot>,
}

impl LikeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            snapshot: Mutex::new(Snapshot::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Counts for each id; unknown ids count zero.
    pub async fn counts<I, S>(&self, ids: I) -> BTreeMap<String, u64>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut snapshot = self.snapshot.lock().await;
        self.refresh(&mut snapshot).await;
        ids.into_iter()
            .map(Into::into)
            .map(|id: String| {
                let count = snapshot.entries.get(&id).map_or(0, count_of);
                (id, count)
            })
            .collect()
    }

    /// Add one like to `id` and return the new count.
    #[tracing::instrument("incrementing like", skip(self))]
    pub async fn increment(&self, id: &str) -> u64 {
        let mut snapshot = self.snapshot.lock().await;
        self.refresh(&mut snapshot).await;
        let count = snapshot.entries.get(id).map_or(0, count_of).saturating_add(1);
        snapshot.entries.insert(id.to_string(), Value::from(count));
        match self.persist(&snapshot.entries).await {
            Ok(modified) => snapshot.modified = modified,
            Err(err) => tracing::warn!(path = %self.path.display(), error = %err, "could not save likes"),
        }
        count
    }

    async fn refresh(&self, snapshot: &mut Snapshot) {
        let modified = match fs::metadata(&self.path).await {
            Ok(meta) => meta.modified().ok(),
            Err(err) => {
                if err.kind() != IoErrorKind::NotFound {
                    tracing::warn!(path = %self.path.display(), error = %err, "could not stat likes file");
                }
                *snapshot = Snapshot::default();
                return;
            },
        };
        if modified.is_some() && modified == snapshot.modified {
            return;
        }
        snapshot.entries = match fs::read(&self.path).await {
            Ok(bytes) => parse_entries(&bytes),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "could not read likes file");
                BTreeMap::new()
            },
        };
        snapshot.modified = modified;
    }

    /// Write via a sibling temporary file and rename over the original.
    async fn persist(&self, entries: &BTreeMap<String, Value>) -> std::io::Result<Option<SystemTime>> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec(entries).map_err(std::io::Error::other)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(fs::metadata(&self.path).await?.modified().ok())
    }
}

fn parse_entries(bytes: &[u8]) -> BTreeMap<String, Value> {
    serde_json::from_slice(bytes).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "likes file is not a JSON object");
        BTreeMap::new()
    })
}

/// Finite numbers count, rounded down and floored at zero; anything else is
/// zero.
fn count_of(value: &Value) -> u64 {
    match value.as_u64() {
        Some(count) => count,
        None => value.as_f64().filter(|v| v.is_finite() && *v > 0.0).map_or(0, |v| v as u64),
    }
}
