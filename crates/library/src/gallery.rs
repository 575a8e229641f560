//! The gallery service.
//!
//! [`Gallery`] is the one place that knows the order of operations:
//! listings are read through the cache, and every mutation happens on
//! storage first and invalidates the cache afterwards.

use crate::error::{ErrorKind, Result};
use crate::likes::LikeStore;
use crate::names::{like_id, sanitize_file_name, thumb_name};
use crate::page::{Page, PageRequest, paginate};
use crate::scan::{DirectoryListing, FileEntry, scan_directory};
use gallery_cache::ListingCache;
use gallery_storage::{BackendHandle, dir_key, validate_path};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Tunables that don't belong to storage or the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Reserved subdirectory holding generated thumbnails.
    pub thumbs_dir: String,
    pub thumb_width: u32,
    pub thumb_quality: u32,
    /// Most files accepted by one upload.
    pub max_files: usize,
    /// Largest single file accepted by an upload, in bytes.
    pub max_file_size: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            thumbs_dir: ".thumbs".to_string(),
            thumb_width: 480,
            thumb_quality: 70,
            max_files: 50,
            max_file_size: 25 * 1024 * 1024,
        }
    }
}

impl Settings {
    /// Fails once an upload carries more than `max_files` files.
    pub fn check_file_count(&self, count: usize) -> Result<()> {
        if count > self.max_files {
            exn::bail!(ErrorKind::UploadRejected(format!("at most {} files per upload", self.max_files)));
        }
        Ok(())
    }

    /// Fails once `file_name` has grown past `max_file_size` bytes.
    pub fn check_file_size(&self, file_name: &str, size: u64) -> Result<()> {
        if size > self.max_file_size {
            exn::bail!(ErrorKind::UploadRejected(format!(
                "{file_name} exceeds {} bytes",
                self.max_file_size
            )));
        }
        Ok(())
    }
}

/// One page of a directory, as served to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage {
    pub dir: String,
    pub dirs: Vec<String>,
    pub files: Vec<FileEntry>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub next_offset: usize,
    pub has_more: bool,
    /// Whether a cache store is active (not whether this page was a hit).
    pub cached: bool,
}

impl ListingPage {
    fn new(dir: String, dirs: Vec<String>, page: Page<FileEntry>, cached: bool) -> Self {
        Self {
            dir,
            dirs,
            files: page.items,
            total: page.total,
            offset: page.offset,
            limit: page.limit,
            next_offset: page.next_offset,
            has_more: page.has_more,
            cached,
        }
    }
}

/// A file handed in for upload.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Name as supplied by the client; cleaned before use.
    pub file_name: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedFile {
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteFailure {
    pub name: String,
    pub error: String,
}

/// Outcome of a delete: names are reported individually.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub deleted: Vec<String>,
    pub failed: Vec<DeleteFailure>,
}

pub struct Gallery {
    backend: BackendHandle,
    cache: ListingCache,
    likes: LikeStore,
    settings: Settings,
}

impl Gallery {
    pub fn new(backend: BackendHandle, cache: ListingCache, likes: LikeStore, settings: Settings) -> Self {
        Self {
            backend,
            cache,
            likes,
            settings,
        }
    }

    pub fn backend(&self) -> &BackendHandle {
        &self.backend
    }

    pub fn cache(&self) -> &ListingCache {
        &self.cache
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Complete listing of `dir`, served from the cache when possible.
    ///
    /// A hit is returned as stored; a miss scans storage and populates the
    /// cache. Scan failures are never cached.
    #[tracing::instrument("listing directory", skip(self))]
    pub async fn listing(&self, dir: &str) -> Result<DirectoryListing> {
        let key = normalize_dir(dir)?;
        if let Some(hit) = self.cache.get::<DirectoryListing>(&key).await {
            tracing::debug!(dir = %key, "Listing cache hit");
            return Ok(hit);
        }
        let listing = scan_directory(&self.backend, &key, &self.settings.thumbs_dir).await?;
        self.cache.set(&key, &listing).await;
        Ok(listing)
    }

    /// One page of `dir` in the requested order.
    pub async fn list(&self, dir: &str, request: &PageRequest) -> Result<ListingPage> {
        let DirectoryListing {
            dir,
            dirs,
            mut all_files,
            ..
        } = self.listing(dir).await?;
        request.order.apply(&mut all_files);
        let page = paginate(&all_files, request.offset, request.limit);
        Ok(ListingPage::new(dir, dirs, page, self.cache.is_enabled()))
    }

    /// Store `files` under `dir`, then invalidate its cached listings.
    ///
    /// Limits are checked before anything is written. If a write fails
    /// part-way, the files already written stay and the cache is still
    /// invalidated.
    #[tracing::instrument("uploading files", skip(self, files), fields(count = files.len()))]
    pub async fn upload(&self, dir: &str, files: Vec<Upload>) -> Result<Vec<UploadedFile>> {
        let key = normalize_dir(dir)?;
        self.settings.check_file_count(files.len())?;
        for file in &files {
            self.settings.check_file_size(&file.file_name, file.data.len() as u64)?;
        }

        let result = self.write_uploads(&key, files).await;
        self.cache.invalidate(&key).await;
        let uploaded = result?;
        tracing::info!(dir = %key, count = uploaded.len(), "Stored uploaded files");
        Ok(uploaded)
    }

    async fn write_uploads(&self, key: &str, files: Vec<Upload>) -> Result<Vec<UploadedFile>> {
        let mut uploaded = Vec::with_capacity(files.len());
        for Upload { file_name, data } in files {
            let name = sanitize_file_name(&file_name);
            let path = Path::new(key).join(&name);
            self.backend
                .write(&path, &data)
                .await
                .map_err(|err| ErrorKind::storage(err, key))?;
            uploaded.push(UploadedFile {
                name,
                size: data.len() as u64,
            });
        }
        Ok(uploaded)
    }

    /// Remove `names` (and their thumbnails) from `dir`, then invalidate the
    /// cached listings of every directory a file was removed from.
    ///
    /// Only a bad `dir` fails the whole call; each name succeeds or fails on
    /// its own. Names that don't exist count as deleted. A name may reach into
    /// a subdirectory (`sub/a.jpg`).
    #[tracing::instrument("deleting files", skip(self, names), fields(count = names.len()))]
    pub async fn delete(&self, dir: &str, names: &[String]) -> Result<DeleteReport> {
        let key = normalize_dir(dir)?;
        let mut report = DeleteReport::default();
        let mut touched = BTreeSet::from([key.clone()]);
        for name in names {
            match self.delete_one(&key, name).await {
                Ok(parent) => {
                    touched.insert(parent);
                    report.deleted.push(name.clone());
                },
                Err(err) => {
                    tracing::warn!(dir = %key, name = %name, error = ?err, "Could not delete file");
                    report.failed.push(DeleteFailure {
                        name: name.clone(),
                        error: (*err).to_string(),
                    });
                },
            }
        }
        for dir in &touched {
            self.cache.invalidate(dir).await;
        }
        Ok(report)
    }

    /// Returns the key of the directory the file lived in.
    async fn delete_one(&self, key: &str, name: &str) -> Result<String> {
        let path = resolve_name(key, name)?;
        let parent = normalize_dir(&path.parent().unwrap_or(Path::new("")).to_string_lossy())?;
        let exists = self.backend.exists(&path).await.map_err(|err| ErrorKind::storage(err, key))?;
        if exists {
            self.backend.delete(&path).await.map_err(|err| ErrorKind::storage(err, key))?;
        }
        self.delete_thumbnail(&path).await;
        Ok(parent)
    }

    /// Thumbnails are disposable, so failing to remove one is not an error.
    async fn delete_thumbnail(&self, image: &Path) {
        let (Some(parent), Some(file_name)) = (image.parent(), image.file_name()) else {
            return;
        };
        let thumb = parent.join(&self.settings.thumbs_dir).join(thumb_name(
            &file_name.to_string_lossy(),
            self.settings.thumb_width,
            self.settings.thumb_quality,
        ));
        if let Ok(true) = self.backend.exists(&thumb).await
            && let Err(err) = self.backend.delete(&thumb).await
        {
            tracing::debug!(thumb = %thumb.display(), error = ?err, "Could not delete thumbnail");
        }
    }

    /// Like counts of `names` in `dir`, keyed by name.
    pub async fn likes(&self, dir: &str, names: &[String]) -> Result<BTreeMap<String, u64>> {
        let key = normalize_dir(dir)?;
        let counts = self.likes.counts(names.iter().map(|name| like_id(&key, name))).await;
        Ok(names
            .iter()
            .map(|name| {
                let count = counts.get(&like_id(&key, name)).copied().unwrap_or(0);
                (name.clone(), count)
            })
            .collect())
    }

    /// Add a like to an existing image and return its new count.
    #[tracing::instrument("liking image", skip(self))]
    pub async fn like(&self, dir: &str, name: &str) -> Result<u64> {
        if name.is_empty() {
            exn::bail!(ErrorKind::BadName(String::new()));
        }
        let key = normalize_dir(dir)?;
        let path = resolve_name(&key, name)?;
        let exists = self.backend.exists(&path).await.map_err(|err| ErrorKind::storage(err, &key))?;
        if !exists {
            exn::bail!(ErrorKind::NotFound(like_id(&key, name)));
        }
        Ok(self.likes.increment(&like_id(&key, name)).await)
    }
}

fn normalize_dir(dir: &str) -> Result<String> {
    dir_key(dir).map_err(|err| ErrorKind::storage(err, dir))
}

/// Resolve `name` to a file strictly inside directory `key`.
fn resolve_name(key: &str, name: &str) -> Result<PathBuf> {
    let bad_name = || ErrorKind::BadName(name.to_string());
    let dir = Path::new(key);
    let Ok(path) = validate_path(dir.join(name)) else {
        exn::bail!(bad_name());
    };
    if !path.starts_with(dir) || path == dir {
        exn::bail!(bad_name());
    }
    Ok(path)
}
