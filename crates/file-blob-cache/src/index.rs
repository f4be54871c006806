//! In-memory listing of the cache directory

use crate::types::CacheEntry;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use tracing::debug;

/// Listing of cached blobs with a running total size.
///
/// Only used for display; it may lag behind the directory until the next
/// [`CacheIndex::scan`].
#[derive(Debug, Clone, Default)]
pub struct CacheIndex {
    entries: BTreeMap<String, CacheEntry>,
    total_size: u64,
}

impl CacheIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index by enumerating `dir` once.
    ///
    /// Hidden files (including in-flight temporary writes) are skipped, as are
    /// entries that disappear between listing and stat.
    pub async fn scan(dir: &Path) -> io::Result<Self> {
        let mut index = Self::new();
        let mut read_dir = tokio::fs::read_dir(dir).await?;

        while let Some(dirent) = read_dir.next_entry().await? {
            let Ok(key) = dirent.file_name().into_string() else {
                continue;
            };
            if key.starts_with('.') {
                continue;
            }

            let metadata = match dirent.metadata().await {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    debug!(key = %key, error = %e, "Skipping unreadable cache entry");
                    continue;
                }
            };

            let modified = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            index.record(CacheEntry {
                key,
                size: metadata.len(),
                modified,
            });
        }

        debug!(entries = index.len(), total_size = index.total_size, "Scanned cache directory");
        Ok(index)
    }

    /// Add or replace an entry, keeping the total size consistent
    pub fn record(&mut self, entry: CacheEntry) {
        if let Some(previous) = self.entries.insert(entry.key.clone(), entry.clone()) {
            self.total_size -= previous.size;
        }
        self.total_size += entry.size;
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Entries ordered by key
    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.values()
    }
}
