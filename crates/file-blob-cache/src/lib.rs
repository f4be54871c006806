//! Directory-backed blob cache for immutable content
//!
//! Each blob lives in one file named after its key. Content for a key never
//! changes, so there is no invalidation or eviction. A separate in-memory
//! [`CacheIndex`] lists the cached files for display and is refreshed
//! explicitly rather than kept in lockstep with the directory.

mod cache;
mod index;
mod types;

pub use cache::BlobCache;
pub use index::CacheIndex;
pub use types::{CacheEntry, CacheStats};
