//! In-memory storage backend for testing.

use super::EntryStream;
use crate::error::{ErrorKind, Result};
use crate::path::{validate as validate_path, validate_dir};
use crate::{EntryInfo, StorageBackend};
use async_stream::stream;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio::sync::RwLock;

/// In-memory storage backend for testing.
///
/// Files are stored in a `HashMap` behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation. Directories are
/// implicit: a directory exists while at least one file lives below it (the
/// root always exists).
///
/// # Examples
///
/// ```
/// use gallery_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([
///     ("Holiday/beach.jpg", b"jpeg..."),
/// ]);
/// assert!(backend.exists(Path::new("Holiday/beach.jpg")).await?);
///
/// backend.write(Path::new("Holiday/sunset.jpg"), b"data...").await?;
/// assert_eq!(backend.list_dir(Path::new("Holiday")).await?.len(), 2);
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    storage: RwLock<HashMap<PathBuf, (OffsetDateTime, Vec<u8>)>>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files.
    ///
    /// Panics if any path fails validation (e.g. path traversal). If test
    /// setup is wrong, then test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = HashMap::new();
        let now = OffsetDateTime::now_utc();
        for (path, data) in files {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                // The panic here is DELIBERATE. MockBackend is intended to be
                // used in tests; panics are expected. There is no error result.
                panic!("MockBackend::with_files: invalid path {}", path.display());
            };
            map.insert(validated, (now, data.into()));
        }
        Self {
            name: "mock".to_string(),
            storage: RwLock::new(map),
        }
    }

    /// Change the name of the mock backend.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Immediate children of `dir`, or `None` if `dir` does not exist.
    fn children(
        storage: &HashMap<PathBuf, (OffsetDateTime, Vec<u8>)>,
        dir: &Path,
    ) -> Option<BTreeMap<PathBuf, EntryInfo>> {
        let mut found = dir.as_os_str().is_empty();
        let mut children = BTreeMap::new();
        for (path, (modified, data)) in storage {
            let Ok(rest) = path.strip_prefix(dir) else { continue };
            let mut components = rest.components();
            let Some(first) = components.next() else { continue };
            found = true;
            let child = dir.join(first);
            let entry = match components.next() {
                None => EntryInfo::file(child.clone(), data.len() as u64, *modified),
                Some(_) => EntryInfo::directory(child.clone(), *modified),
            };
            children.entry(child).or_insert(entry);
        }
        found.then_some(children)
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, dir: &'a Path) -> EntryStream<'a> {
        let validated = match validate_dir(dir) {
            Ok(validated) => validated,
            Err(e) => return Box::pin(futures::stream::once(async { Err(e) })),
        };

        Box::pin(stream! {
            // Snapshot matching entries under the read lock, then drop it
            // before yielding to avoid holding the lock across yield points.
            let snapshot = {
                let guard = self.storage.read().await;
                match Self::children(&guard, &validated) {
                    Some(children) => Ok(children),
                    None if guard.contains_key(&validated) => Err(ErrorKind::NotADirectory(validated.clone())),
                    None => Err(ErrorKind::NotFound(validated.clone())),
                }
            };
            match snapshot {
                Ok(children) => for (_, entry) in children {
                    yield Ok(entry);
                },
                Err(kind) => yield Err(exn::Exn::from(kind)),
            }
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = validate_path(path)?;
        Ok(self.storage.read().await.contains_key(&path))
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        self.storage.write().await.insert(path, (OffsetDateTime::now_utc(), data.to_vec()));
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        self.storage.write().await.remove(&path).map(|_| ()).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_root_and_subdirectories() {
        let backend = MockBackend::with_files([
            ("a.jpg", b"1".as_slice()),
            ("Holiday/b.jpg", b"22".as_slice()),
            ("Holiday/2024/c.jpg", b"333".as_slice()),
        ]);
        let root = backend.list_dir(Path::new("")).await.unwrap();
        let root: Vec<_> = root.iter().map(|e| (e.name(), e.is_dir())).collect();
        assert_eq!(root, vec![("Holiday".to_string(), true), ("a.jpg".to_string(), false)]);

        let holiday = backend.list_dir(Path::new("Holiday")).await.unwrap();
        assert_eq!(holiday.len(), 2);
        let file = holiday.iter().find(|e| e.is_file()).unwrap();
        assert_eq!(file.path, Path::new("Holiday/b.jpg"));
        assert_eq!(file.size, 2);
    }

    #[tokio::test]
    async fn test_list_missing_and_file() {
        let backend = MockBackend::with_files([("a.jpg", b"1")]);
        let err = backend.list_dir(Path::new("missing")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        let err = backend.list_dir(Path::new("a.jpg")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotADirectory(_)));
    }

    #[tokio::test]
    async fn test_empty_root_lists_nothing() {
        let backend = MockBackend::default();
        assert!(backend.list_dir(Path::new("")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_delete() {
        let backend = MockBackend::default().with_name("test");
        assert_eq!(backend.name(), "test");
        backend.write(Path::new("x/y.png"), b"data").await.unwrap();
        assert!(backend.exists(Path::new("x/y.png")).await.unwrap());
        backend.delete(Path::new("x/y.png")).await.unwrap();
        assert!(!backend.exists(Path::new("x/y.png")).await.unwrap());
        // The directory vanishes with its last file.
        assert!(backend.list_dir(Path::new("x")).await.is_err());
        assert!(backend.delete(Path::new("x/y.png")).await.is_err());
    }

    #[test]
    #[should_panic(expected = "invalid path")]
    fn test_with_files_rejects_traversal() {
        MockBackend::with_files([("../escape.jpg", b"")]);
    }
}
