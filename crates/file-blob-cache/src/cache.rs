//! Directory-backed blob cache

use crate::index::CacheIndex;
use crate::types::{CacheEntry, CacheStats};
use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info};

const MAX_KEY_LENGTH: usize = 128;

/// Blob cache storing one file per key under `cache_dir`.
///
/// Writes for the same key are last-write-wins; callers only ever write the
/// same immutable content for a key.
pub struct BlobCache {
    cache_dir: PathBuf,
    index: RwLock<CacheIndex>,
    hits: AtomicU64,
    misses: AtomicU64,
    write_seq: AtomicU64,
}

impl BlobCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            index: RwLock::new(CacheIndex::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            write_seq: AtomicU64::new(0),
        }
    }

    /// Create the cache directory if needed and build the initial index
    pub async fn init(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.cache_dir).await?;
        self.refresh_index().await?;

        let index = self.index.read().await;
        info!(
            entries = index.len(),
            total_size = index.total_size(),
            "Cache initialized"
        );
        Ok(())
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Keys become file names, so only a conservative character set is allowed
    pub fn is_valid_key(key: &str) -> bool {
        !key.is_empty()
            && key.len() <= MAX_KEY_LENGTH
            && key
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }

    fn path_for(&self, key: &str) -> Option<PathBuf> {
        Self::is_valid_key(key).then(|| self.cache_dir.join(key))
    }

    /// Whether a blob for `key` exists on disk
    pub async fn has(&self, key: &str) -> bool {
        match self.path_for(key) {
            Some(path) => tokio::fs::try_exists(&path).await.unwrap_or(false),
            None => false,
        }
    }

    /// Read the blob for `key`, or `None` on a miss
    pub async fn read(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        let Some(path) = self.path_for(key) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        };

        match tokio::fs::read(&path).await {
            Ok(data) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key, size = data.len(), "Cache hit");
                Ok(Some(data))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key, "Cache miss");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Store `data` under `key` and record it in the index.
    ///
    /// The blob is written to a hidden sibling first and renamed into place,
    /// so readers never observe a partial file.
    pub async fn write(&self, key: &str, data: &[u8]) -> io::Result<()> {
        let path = self.path_for(key).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid cache key: {:?}", key),
            )
        })?;

        let seq = self.write_seq.fetch_add(1, Ordering::Relaxed);
        let temp_path = self.cache_dir.join(format!(".{}.{}.tmp", key, seq));
        tokio::fs::write(&temp_path, data).await?;
        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }

        self.index.write().await.record(CacheEntry {
            key: key.to_string(),
            size: data.len() as u64,
            modified: Utc::now(),
        });
        debug!(key, size = data.len(), "Cached blob");
        Ok(())
    }

    /// Re-enumerate the cache directory into the index
    pub async fn refresh_index(&self) -> io::Result<()> {
        let scanned = CacheIndex::scan(&self.cache_dir).await?;
        *self.index.write().await = scanned;
        Ok(())
    }

    /// Snapshot of the current index
    pub async fn listing(&self) -> CacheIndex {
        self.index.read().await.clone()
    }

    pub async fn stats(&self) -> CacheStats {
        let index = self.index.read().await;
        CacheStats {
            entries: index.len(),
            total_size: index.total_size(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
