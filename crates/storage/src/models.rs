//! Storage models.
//!
//! These types represent the metadata storage backends return when listing
//! a directory or inspecting a single path.

use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// What kind of filesystem object an entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Entry metadata returned by storage backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// Relative path from storage root
    pub path: PathBuf,
    pub kind: EntryKind,
    /// Size in bytes (zero for directories)
    pub size: u64,
    /// Last modified timestamp
    pub modified: OffsetDateTime,
}
impl EntryInfo {
    pub fn file(path: impl Into<PathBuf>, size: u64, modified: impl Into<OffsetDateTime>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            size,
            modified: modified.into(),
        }
    }

    pub fn directory(path: impl Into<PathBuf>, modified: impl Into<OffsetDateTime>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
            size: 0,
            modified: modified.into(),
        }
    }

    /// Final path component, lossily converted to UTF-8.
    pub fn name(&self) -> String {
        self.path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Lower-cased extension including the leading dot (`".jpg"`), or an
    /// empty string for extension-less names and dotfiles.
    pub fn extension(&self) -> String {
        extension_of(&self.path)
    }
}

pub(crate) fn extension_of(path: &Path) -> String {
    path.extension().map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase())).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("photo.jpg", ".jpg")]
    #[case("a/b/PHOTO.JPEG", ".jpeg")]
    #[case("archive.tar.gz", ".gz")]
    // `.png` is a dotfile with no extension (like `.bashrc`)
    #[case(".png", "")]
    #[case("README", "")]
    fn test_extension(#[case] path: &str, #[case] expected: &str) {
        let entry = EntryInfo::file(path, 0, OffsetDateTime::UNIX_EPOCH);
        assert_eq!(entry.extension(), expected);
    }

    #[test]
    fn test_name() {
        let entry = EntryInfo::directory("a/b/Holiday", OffsetDateTime::UNIX_EPOCH);
        assert_eq!(entry.name(), "Holiday");
        assert!(entry.is_dir());
        assert!(!entry.is_file());
        assert_eq!(entry.size, 0);
    }
}
