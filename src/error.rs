//! Binary Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A start-up or command error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for the binary.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Fix the configuration file or environment.
    #[display("invalid configuration")]
    Config,
    /// The image directory could not be opened.
    #[display("cannot use image directory {}", _0.display())]
    ImagesDir(#[error(not(source))] PathBuf),
    /// Another process holds the address, or it isn't ours to take.
    #[display("cannot listen on {_0}")]
    Bind(#[error(not(source))] String),
    /// The server stopped with an error.
    #[display("server error")]
    Serve,
    /// A one-shot command failed.
    #[display("could not list {_0:?}")]
    List(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Bind(_) | Self::Serve)
    }
}
