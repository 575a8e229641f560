//! Wiring configuration into a running [`Gallery`].

use crate::error::{ErrorKind, Result};
use gallery_cache::{ListingCache, MemoryStore, StoreHandle};
use gallery_config::{CacheBackend, Config};
use gallery_library::{Gallery, LikeStore, Limits, Settings};
use gallery_storage::backend::LocalBackend;
use std::sync::Arc;

/// Open the image directory and cache store described by `config`.
///
/// A cache store that can't be reached is not fatal: the gallery runs
/// uncached and says so in the log.
pub async fn build_gallery(config: &Config) -> Result<Gallery> {
    let backend = LocalBackend::new("images", &config.images_dir)
        .map_err(|err| err.raise(ErrorKind::ImagesDir(config.images_dir.clone())))?;
    let store = cache_store(config).await;
    match &store {
        Some(store) => tracing::info!(store = store.name(), ttl_secs = config.cache.ttl_secs, "Listing cache enabled"),
        None => tracing::info!("Listing cache disabled"),
    }
    Ok(Gallery::new(
        Arc::new(backend),
        ListingCache::new(store, config.cache.ttl()),
        LikeStore::new(config.likes_file()),
        settings(config),
    ))
}

pub fn settings(config: &Config) -> Settings {
    Settings {
        thumbs_dir: config.thumbs.dir_name.clone(),
        thumb_width: config.thumbs.width,
        thumb_quality: config.thumbs.quality,
        max_files: config.upload.max_files,
        max_file_size: config.upload.max_file_size as u64,
    }
}

pub fn limits(config: &Config) -> Limits {
    Limits {
        default_limit: config.listing.default_limit,
        max_limit: config.listing.max_limit,
    }
}

async fn cache_store(config: &Config) -> Option<StoreHandle> {
    match config.effective_cache_backend() {
        CacheBackend::Auto | CacheBackend::Disabled => None,
        CacheBackend::Memory => Some(Arc::new(MemoryStore::new())),
        CacheBackend::Redis => redis_store(config).await,
    }
}

#[cfg(feature = "redis")]
async fn redis_store(config: &Config) -> Option<StoreHandle> {
    let url = config.redis_url()?;
    match gallery_cache::RedisStore::connect(url).await {
        Ok(store) => Some(Arc::new(store)),
        Err(err) => {
            tracing::warn!(error = ?err, "Redis unavailable; running without a listing cache");
            None
        },
    }
}

#[cfg(not(feature = "redis"))]
async fn redis_store(_config: &Config) -> Option<StoreHandle> {
    tracing::warn!("Built without Redis support; running without a listing cache");
    None
}
