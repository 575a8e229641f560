pub mod error;
mod gallery;
mod likes;
mod names;
pub mod page;
pub mod scan;
mod shuffle;

pub use crate::gallery::{DeleteFailure, DeleteReport, Gallery, ListingPage, Settings, Upload, UploadedFile};
pub use crate::likes::LikeStore;
pub use crate::names::{like_id, sanitize_file_name, thumb_name};
pub use crate::page::{Limits, Order, PageRequest};
pub use crate::scan::{DirectoryListing, FileEntry};
pub use crate::shuffle::{hash_seed, seeded_shuffle};
