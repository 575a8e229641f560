//! Directory scanning.
//!
//! Reads the immediate children of one gallery directory and classifies them
//! into subdirectories and image files. The scan is all-or-nothing: a storage
//! failure part-way through produces an error, never a partial listing.

use crate::error::{ErrorKind, Result};
use gallery_storage::{BackendHandle, EntryInfo, dir_key};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Recognized image extensions, lowercase with the leading dot.
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp", ".svg"];

/// One image in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub url: String,
    pub thumb_url: String,
}

impl FileEntry {
    pub fn new(dir: &str, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            url: public_url(dir, &name),
            thumb_url: thumb_url(dir, &name),
            name,
        }
    }
}

/// Complete, unpaginated contents of one directory.
///
/// This is the unit stored in the listing cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryListing {
    /// Normalized directory key (`""` for the root).
    pub dir: String,
    /// Immediate subdirectory names, sorted, without the thumbnail directory.
    pub dirs: Vec<String>,
    /// Image files, sorted by name.
    pub all_files: Vec<FileEntry>,
    pub total: usize,
}

/// Whether the file name carries a recognized image extension.
pub fn is_image_file(name: impl AsRef<Path>) -> bool {
    let Some(ext) = name.as_ref().extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    let ext = format!(".{}", ext.to_lowercase());
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}

/// Public URL the image is served at.
pub fn public_url(dir: &str, name: &str) -> String {
    match dir.is_empty() {
        true => format!("/images/{name}"),
        false => format!("/images/{dir}/{name}"),
    }
}

/// URL of the thumbnail endpoint for the image.
pub fn thumb_url(dir: &str, name: &str) -> String {
    format!(
        "/api/thumb?dir={}&name={}",
        urlencoding::encode(dir),
        urlencoding::encode(name)
    )
}

/// Read and classify the immediate children of `dir`.
///
/// Entries named `thumbs_dir` are left out of the subdirectory list, and
/// files without an image extension are ignored.
#[tracing::instrument("scanning directory", skip(backend, thumbs_dir))]
pub async fn scan_directory(backend: &BackendHandle, dir: &str, thumbs_dir: &str) -> Result<DirectoryListing> {
    let key = dir_key(dir).map_err(|err| ErrorKind::storage(err, dir))?;
    let entries = backend
        .list_dir(Path::new(&key))
        .await
        .map_err(|err| ErrorKind::storage(err, &key))?;
    Ok(classify(key, entries, thumbs_dir))
}

fn classify(dir: String, entries: Vec<EntryInfo>, thumbs_dir: &str) -> DirectoryListing {
    let mut dirs = Vec::new();
    let mut names = Vec::new();
    for entry in entries {
        let name = entry.name();
        if entry.is_dir() {
            if name != thumbs_dir {
                dirs.push(name);
            }
        } else if entry.is_file() && IMAGE_EXTENSIONS.contains(&entry.extension().as_str()) {
            names.push(name);
        }
    }
    dirs.sort();
    dirs.dedup();
    names.sort();

    let all_files: Vec<FileEntry> = names.into_iter().map(|name| FileEntry::new(&dir, name)).collect();
    DirectoryListing {
        total: all_files.len(),
        dir,
        dirs,
        all_files,
    }
}
