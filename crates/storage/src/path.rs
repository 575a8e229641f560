//! Path validation and security utilities.
//!
//! This module provides functions to validate storage paths and prevent
//! security issues like path traversal attacks.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a storage path for security and correctness.
/// Ensures that paths don't escape the storage root (no `..` traversal).
///
/// > **Note:** This does **not** normalize backslashes, non-UTF8 bytes, or
/// >           platform-specific weirdness. Null bytes are explicitly rejected.
///
/// # Returns
/// Returns the normalized path if valid, or [`InvalidPath`](crate::error::ErrorKind::InvalidPath)
/// if invalid. A path that normalizes to the storage root itself is invalid;
/// use [`validate_dir`] for directory paths where the root is allowed.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use gallery_storage::validate_path;
/// // Valid paths
/// assert!(validate_path("Holiday/beach.jpg").is_ok());
/// assert!(validate_path("a/b/c/photo.png").is_ok());
/// assert!(validate_path("a/../photo.png").is_ok()); // (never leaves gallery root)
/// // Invalid paths
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("a/../../b").is_err()); // (leaves gallery root)
/// assert!(validate_path("a\0b").is_err());
/// // Paths get resolved
/// assert_eq!(
///     validate_path("wrong/../still-wrong/.././correct//./photo.jpg/").unwrap(),
///     Path::new("correct/photo.jpg")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let normalized = normalize(path.as_ref())?;
    match normalized.as_os_str().is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
        false => Ok(normalized),
    }
}

/// Validates a directory path relative to the storage root.
///
/// Same rules as [`validate`], except that a path resolving to the root
/// itself (`""`, `"."`, `"/"`) is valid and returns an empty path.
///
/// ```
/// use std::path::Path;
/// use gallery_storage::validate_dir;
/// assert_eq!(validate_dir("").unwrap(), Path::new(""));
/// assert_eq!(validate_dir("/Holiday/2024/").unwrap(), Path::new("Holiday/2024"));
/// assert!(validate_dir("..").is_err());
/// ```
pub fn validate_dir(path: impl AsRef<Path>) -> Result<PathBuf> {
    normalize(path.as_ref())
}

/// Validates a directory path and renders it as a directory key: the
/// normalized components joined by `/`, with the root as `""`.
///
/// ```
/// use gallery_storage::dir_key;
/// assert_eq!(dir_key("").unwrap(), "");
/// assert_eq!(dir_key("./a//b/").unwrap(), "a/b");
/// assert!(dir_key("a/../../b").is_err());
/// ```
pub fn dir_key(path: impl AsRef<Path>) -> Result<String> {
    let validated = validate_dir(path)?;
    let parts: Vec<_> = validated.components().map(|c| c.as_os_str().to_string_lossy()).collect();
    Ok(parts.join("/"))
}

fn normalize(path: &Path) -> Result<PathBuf> {
    // Use Rust's built-in path component parser for robust handling. Means we
    // don't have to deal with non-UTF8, or the maniacs on Unix that use
    // backslashes in their filenames.
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls; reject them explicitly.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
                }
            },
        }
    }
    Ok(components.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_valid_paths() {
        assert_eq!(validate(Path::new("Holiday/beach.jpg")).unwrap(), Path::new("Holiday/beach.jpg"));
        assert_eq!(validate(Path::new("a/b/c/photo.png")).unwrap(), Path::new("a/b/c/photo.png"));
        assert_eq!(validate(Path::new("simple.gif")).unwrap(), Path::new("simple.gif"));
    }

    #[test]
    fn test_path_normalization() {
        // Double slashes are normalized
        assert_eq!(validate(Path::new("a//b//c")).unwrap(), Path::new("a/b/c"));
        // Current directory references removed
        assert_eq!(validate(Path::new("a/./b/./c")).unwrap(), Path::new("a/b/c"));
        // Leading slashes are relative to the gallery root
        assert_eq!(validate(Path::new("/a/b")).unwrap(), Path::new("a/b"));
    }

    #[test]
    fn test_traversal_attempts() {
        assert!(validate(Path::new("../etc/passwd")).is_err());
        assert!(validate(Path::new("a/../../b")).is_err());
        assert!(validate(Path::new("..")).is_err());
        assert!(validate(Path::new("../..")).is_err());
        assert!(validate_dir(Path::new("..")).is_err());
        assert!(validate_dir(Path::new("a/../..")).is_err());
    }

    #[test]
    fn test_reverse_attempts() {
        // Traversal remains within gallery root
        assert_eq!(validate(Path::new("a/b/..")).unwrap(), Path::new("a"));
        assert_eq!(validate_dir(Path::new("a/..")).unwrap(), Path::new(""));
    }

    #[test]
    fn test_invalid_characters() {
        assert!(validate(Path::new("a\0b")).is_err());
        assert!(validate(Path::new("\0")).is_err());
        assert!(validate_dir(Path::new("dir\0")).is_err());
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("./")]
    #[case("./.")]
    #[case("//")]
    fn test_empty_paths(#[case] input: &str) {
        assert!(validate(Path::new(input)).is_err());
        assert_eq!(validate_dir(Path::new(input)).unwrap(), Path::new(""));
    }

    #[rstest]
    #[case("", "")]
    #[case("/", "")]
    #[case("Holiday", "Holiday")]
    #[case("Holiday/", "Holiday")]
    #[case("/Holiday//2024/./", "Holiday/2024")]
    #[case("a/b/../c", "a/c")]
    fn test_dir_key(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(dir_key(input).unwrap(), expected);
    }

    #[test]
    fn test_trailing_slashes() {
        assert_eq!(validate(Path::new("Holiday/")).unwrap(), Path::new("Holiday"));
        assert_eq!(validate(Path::new("a/b/c/")).unwrap(), Path::new("a/b/c"));
        assert_eq!(validate(Path::new("Holiday///")).unwrap(), Path::new("Holiday"));
    }
}
