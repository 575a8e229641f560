//! Gallery configuration.
//!
//! Values are layered with [`figment`], later sources overriding earlier
//! ones:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. A TOML file: the one passed explicitly, otherwise `gallery.toml` in the
//!    platform configuration directory if it exists.
//! 3. The bare environment variables the gallery has always understood
//!    (`PORT`, `IMAGES_DIR`, `UPLOAD_TOKEN`, `REDIS_URL`, `LIKES_FILE`,
//!    `BUILD_ID`, `THUMB_WIDTH`, `THUMB_QUALITY`).
//! 4. `GALLERY_`-prefixed environment variables, with `__` separating nested
//!    keys (`GALLERY_LISTING__MAX_LIMIT=200`).

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const LEGACY_ENV: &[&str] = &[
    "port",
    "images_dir",
    "upload_token",
    "redis_url",
    "likes_file",
    "build_id",
    "thumb_width",
    "thumb_quality",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Root of the image tree served by the gallery.
    pub images_dir: PathBuf,
    /// Shared secret for upload/delete. Unset (or empty) leaves them open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis_url: Option<String>,
    /// Defaults to `.likes.json` inside `images_dir`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes_file: Option<PathBuf>,
    pub build_id: String,
    pub autoplay_ms: u64,
    pub listing: ListingConfig,
    pub cache: CacheConfig,
    pub thumbs: ThumbsConfig,
    pub upload: UploadConfig,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            images_dir: PathBuf::from("/images"),
            upload_token: None,
            redis_url: None,
            likes_file: None,
            build_id: "dev".to_string(),
            autoplay_ms: 3000,
            listing: ListingConfig::default(),
            cache: CacheConfig::default(),
            thumbs: ThumbsConfig::default(),
            upload: UploadConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Page size when the client doesn't ask for one.
    pub default_limit: usize,
    /// Upper bound that larger requested page sizes are clamped to.
    pub max_limit: usize,
}
impl Default for ListingConfig {
    fn default() -> Self {
        Self { default_limit: 120, max_limit: 500 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Redis when `redis_url` is set, otherwise no cache.
    Auto,
    #[serde(rename = "none")]
    Disabled,
    Memory,
    Redis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub ttl_secs: u64,
}
impl Default for CacheConfig {
    fn default() -> Self {
        Self { backend: CacheBackend::Auto, ttl_secs: 30 }
    }
}
impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbsConfig {
    /// Reserved sub-directory holding generated thumbnails; never listed.
    pub dir_name: String,
    pub width: u32,
    pub quality: u32,
}
impl Default for ThumbsConfig {
    fn default() -> Self {
        Self {
            dir_name: ".thumbs".to_string(),
            width: 480,
            quality: 70,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_files: usize,
    /// Per-file limit in bytes.
    pub max_file_size: usize,
}
impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_files: 50,
            max_file_size: 25 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load and validate the configuration.
    ///
    /// `path` is an explicitly requested TOML file, which must exist. Without
    /// one, the platform default location is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(path)?.extract().or_raise(|| ErrorKind::Load)?;
        config.validated()
    }

    /// The layered figment before extraction, useful for debugging where a
    /// value came from.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        match path {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::MissingFile(path.to_path_buf()));
                }
                figment = figment.merge(Toml::file(path));
            },
            None => {
                if let Some(path) = Self::default_file() {
                    tracing::debug!(path = %path.display(), "Looking for default configuration file");
                    figment = figment.merge(Toml::file(path));
                }
            },
        }
        Ok(figment.merge(Self::legacy_env()).merge(Env::prefixed("GALLERY_").split("__")))
    }

    /// `gallery.toml` inside the platform configuration directory.
    pub fn default_file() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "gallery").map(|dirs| dirs.config_dir().join("gallery.toml"))
    }

    fn legacy_env() -> Env {
        // Keys reach the mapper with their original (upper) case.
        Env::raw().only(LEGACY_ENV).map(|key| match key.as_str().to_ascii_lowercase().as_str() {
            "thumb_width" => "thumbs.width".into(),
            "thumb_quality" => "thumbs.quality".into(),
            other => other.to_owned().into(),
        })
    }

    fn validated(self) -> Result<Self> {
        let listing = &self.listing;
        if listing.max_limit == 0 {
            exn::bail!(ErrorKind::Invalid("listing.max_limit must be at least 1".to_string()));
        }
        if listing.default_limit == 0 || listing.default_limit > listing.max_limit {
            exn::bail!(ErrorKind::Invalid(format!(
                "listing.default_limit must be between 1 and {}",
                listing.max_limit
            )));
        }
        if self.cache.ttl_secs == 0 {
            exn::bail!(ErrorKind::Invalid("cache.ttl_secs must be at least 1".to_string()));
        }
        if self.upload.max_files == 0 || self.upload.max_file_size == 0 {
            exn::bail!(ErrorKind::Invalid("upload limits must be non-zero".to_string()));
        }
        if self.thumbs.dir_name.is_empty() || self.thumbs.dir_name.contains('/') {
            exn::bail!(ErrorKind::Invalid("thumbs.dir_name must be a single path component".to_string()));
        }
        if self.cache.backend == CacheBackend::Redis && self.redis_url().is_none() {
            exn::bail!(ErrorKind::Invalid("cache.backend = \"redis\" requires redis_url".to_string()));
        }
        Ok(self)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn upload_token(&self) -> Option<&str> {
        self.upload_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn redis_url(&self) -> Option<&str> {
        self.redis_url.as_deref().filter(|u| !u.is_empty())
    }

    pub fn likes_file(&self) -> PathBuf {
        self.likes_file.clone().unwrap_or_else(|| self.images_dir.join(".likes.json"))
    }

    /// The cache backend that will actually be used once `auto` is resolved.
    pub fn effective_cache_backend(&self) -> CacheBackend {
        match (self.cache.backend, self.redis_url()) {
            (CacheBackend::Auto, Some(_)) => CacheBackend::Redis,
            (CacheBackend::Auto, None) => CacheBackend::Disabled,
            (backend, _) => backend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default().validated().unwrap();
        assert_eq!(config.listen_addr(), "0.0.0.0:3000");
        assert_eq!(config.likes_file(), Path::new("/images/.likes.json"));
        assert_eq!(config.cache.ttl(), Duration::from_secs(30));
        assert_eq!(config.effective_cache_backend(), CacheBackend::Disabled);
    }

    #[test]
    fn test_toml_file_then_env_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "gallery.toml",
                r#"
                    port = 8080
                    images_dir = "/srv/photos"

                    [listing]
                    default_limit = 60

                    [cache]
                    backend = "memory"
                "#,
            )?;
            jail.set_env("GALLERY_LISTING__MAX_LIMIT", "200");
            jail.set_env("UPLOAD_TOKEN", "s3cret");

            let config = Config::load(Some(Path::new("gallery.toml"))).unwrap();
            assert_eq!(config.port, 8080);
            assert_eq!(config.images_dir, Path::new("/srv/photos"));
            assert_eq!(config.listing.default_limit, 60);
            assert_eq!(config.listing.max_limit, 200);
            assert_eq!(config.cache.backend, CacheBackend::Memory);
            assert_eq!(config.upload_token(), Some("s3cret"));
            assert_eq!(config.likes_file(), Path::new("/srv/photos/.likes.json"));
            Ok(())
        });
    }

    #[test]
    fn test_legacy_environment_variables() {
        Jail::expect_with(|jail| {
            jail.create_file("empty.toml", "")?;
            jail.set_env("PORT", "4000");
            jail.set_env("IMAGES_DIR", "/data/images");
            jail.set_env("REDIS_URL", "redis://cache:6379");
            jail.set_env("THUMB_WIDTH", "320");
            jail.set_env("THUMB_QUALITY", "55");

            let config = Config::load(Some(Path::new("empty.toml"))).unwrap();
            assert_eq!(config.port, 4000);
            assert_eq!(config.images_dir, Path::new("/data/images"));
            assert_eq!(config.redis_url(), Some("redis://cache:6379"));
            assert_eq!(config.thumbs.width, 320);
            assert_eq!(config.thumbs.quality, 55);
            assert_eq!(config.effective_cache_backend(), CacheBackend::Redis);
            Ok(())
        });
    }

    #[test]
    fn test_empty_token_means_open() {
        let config = Config {
            upload_token: Some(String::new()),
            ..Config::default()
        };
        assert_eq!(config.upload_token(), None);
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MissingFile(_)));
    }

    #[test]
    fn test_malformed_file() {
        Jail::expect_with(|jail| {
            jail.create_file("bad.toml", "port = \"not a number\"")?;
            let err = Config::load(Some(Path::new("bad.toml"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Load));
            Ok(())
        });
    }

    #[rstest]
    #[case(ListingConfig { default_limit: 120, max_limit: 0 })]
    #[case(ListingConfig { default_limit: 0, max_limit: 500 })]
    #[case(ListingConfig { default_limit: 600, max_limit: 500 })]
    fn test_invalid_listing_limits(#[case] listing: ListingConfig) {
        let config = Config { listing, ..Config::default() };
        let err = config.validated().unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }

    #[rstest]
    #[case(CacheConfig { backend: CacheBackend::Auto, ttl_secs: 0 })]
    #[case(CacheConfig { backend: CacheBackend::Redis, ttl_secs: 30 })]
    fn test_invalid_cache(#[case] cache: CacheConfig) {
        let config = Config { cache, ..Config::default() };
        assert!(config.validated().is_err());
    }

    #[rstest]
    #[case(CacheBackend::Auto, None, CacheBackend::Disabled)]
    #[case(CacheBackend::Auto, Some("redis://x"), CacheBackend::Redis)]
    #[case(CacheBackend::Memory, Some("redis://x"), CacheBackend::Memory)]
    #[case(CacheBackend::Disabled, Some("redis://x"), CacheBackend::Disabled)]
    fn test_effective_cache_backend(
        #[case] backend: CacheBackend,
        #[case] redis_url: Option<&str>,
        #[case] expected: CacheBackend,
    ) {
        let config = Config {
            redis_url: redis_url.map(str::to_string),
            cache: CacheConfig { backend, ttl_secs: 30 },
            ..Config::default()
        };
        assert_eq!(config.effective_cache_backend(), expected);
    }
}
