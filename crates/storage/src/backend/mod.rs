//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, which provides a unified
//! interface for the handful of storage operations the gallery needs: listing
//! one directory, and writing/deleting individual images.
//!

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::EntryInfo;
use crate::error::Result;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::path::Path;
use std::pin::Pin;

pub(crate) type EntryStream<'a> = Pin<Box<dyn Stream<Item = Result<EntryInfo>> + Send + 'a>>;

/// Unified interface for storage backends.
///
/// # Path Handling
/// All paths are relative to the storage root and must be validated using
/// [`validate_path`](crate::validate_path) (files) or
/// [`validate_dir`](crate::validate_dir) (directories) before use.
/// Implementations enforce this validation.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use gallery_storage::{backend::StorageBackend, error::Result};
///
/// async fn count_images(backend: &dyn StorageBackend) -> Result<usize> {
///     let entries = backend.list_dir(Path::new("Holiday")).await?;
///     Ok(entries.iter().filter(|e| e.is_file()).count())
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend (used for logging only).
    fn name(&self) -> &str;

    /// List the immediate entries of a directory.
    ///
    /// Default implementation of this method is to collect all the results
    /// from [`list_stream()`](Self::list_stream) into a [`Vec`] before
    /// returning. Entries are returned in no particular order.
    async fn list_dir(&self, dir: &Path) -> Result<Vec<EntryInfo>> {
        self.list_stream(dir).try_collect().await
    }

    /// Stream the immediate entries (files and sub-directories) of a
    /// directory. An empty `dir` means the storage root.
    ///
    /// Unlike a recursive walk, asking for a directory that doesn't exist is
    /// an error: the stream yields [`NotFound`](crate::error::ErrorKind::NotFound)
    /// (or [`NotADirectory`](crate::error::ErrorKind::NotADirectory) when the
    /// path is a file) and ends.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::TryStreamExt;
    /// use std::path::Path;
    /// # use gallery_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// let mut stream = backend.list_stream(Path::new(""));
    /// while let Some(entry) = stream.try_next().await? {
    ///     println!("{}: {} bytes", entry.path.display(), entry.size);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    fn list_stream<'a>(&'a self, dir: &'a Path) -> EntryStream<'a>;

    /// Check if a file exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Write file contents.
    ///
    /// Creates a new file or overwrites an existing file with the provided
    /// data. Implementations create parent directories as needed.
    ///
    /// ```no_run
    /// use std::path::Path;
    /// # use gallery_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// backend.write(Path::new("Holiday/beach.jpg"), b"...").await?;
    /// # Ok(())
    /// # }
    /// ```
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Delete a file.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn delete(&self, path: &Path) -> Result<()>;
}
