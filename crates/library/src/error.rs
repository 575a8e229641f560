//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use gallery_storage::error::Error as StorageError;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Directory escapes the gallery root, doesn't exist, or isn't a
    /// directory. Fix the request.
    #[display("bad dir: {_0}")]
    BadPath(#[error(not(source))] String),
    /// File name is empty or escapes its directory. Fix the request.
    #[display("bad name: {_0}")]
    BadName(#[error(not(source))] String),
    /// The named image does not exist.
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// Upload violates the configured limits.
    #[display("upload rejected: {_0}")]
    UploadRejected(#[error(not(source))] String),
    /// Storage failed underneath us (permissions, I/O). Carries the
    /// underlying message.
    #[display("{_0}")]
    Storage(#[error(not(source))] String),
}

impl ErrorKind {
    /// Raise a storage error into the library's error tree, classifying it
    /// as the caller's fault ([`BadPath`](Self::BadPath)) or ours
    /// ([`Storage`](Self::Storage)).
    #[track_caller]
    pub(crate) fn storage(err: StorageError, dir: &str) -> Error {
        let kind = match err.is_bad_path() {
            true => ErrorKind::BadPath(dir.to_string()),
            false => ErrorKind::Storage((*err).to_string()),
        };
        err.raise(kind)
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns `true` if the request itself was at fault.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gallery_storage::error::ErrorKind as StorageErrorKind;
    use std::path::PathBuf;

    #[test]
    fn test_storage_classification() {
        let missing = exn::Exn::from(StorageErrorKind::NotFound(PathBuf::from("a")));
        let err = ErrorKind::storage(missing, "a");
        assert!(matches!(&*err, ErrorKind::BadPath(dir) if dir == "a"));
        assert!(err.is_client_error());

        let denied = exn::Exn::from(StorageErrorKind::PermissionDenied(PathBuf::from("b")));
        let err = ErrorKind::storage(denied, "b");
        assert!(matches!(&*err, ErrorKind::Storage(msg) if msg == "permission denied: b"));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorKind::BadPath("../x".to_string()).to_string(), "bad dir: ../x");
        assert_eq!(ErrorKind::BadName(String::new()).to_string(), "bad name: ");
    }
}
