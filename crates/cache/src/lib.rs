//! Best-effort cache for directory listings.
//!
//! The cache is not the source of truth - the filesystem is. Every read is
//! allowed to miss: when no store is configured, or the store is unreachable,
//! callers simply rebuild the listing from storage. Nothing in here is ever
//! required for a correct answer, only for a fast one.
//!
//! # Architecture
//! - [`CacheStore`]: a minimal string key-value interface with per-key TTL,
//!   implemented in-process by [`MemoryStore`] and (feature `redis`) by
//!   [`RedisStore`].
//! - [`ListingCache`]: typed JSON values keyed by directory, with
//!   ancestor-chain invalidation for mutations.

pub mod error;
mod listing;
mod store;

pub use crate::listing::{DEFAULT_TTL, ListingCache, ancestor_chain};
pub use crate::store::memory::{Clock, MemoryStore, SystemClock};
#[cfg(feature = "redis")]
pub use crate::store::redis::RedisStore;
pub use crate::store::{CacheStore, StoreHandle};
