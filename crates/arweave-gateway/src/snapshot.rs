//! Wallet stats snapshot persisted between home page requests

use crate::adapter::StorageAdapter;
use crate::error::Result;
use arweave_client::winston_to_ar;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

const DEFAULT_FILE_NAME: &str = "stats-cache.json";

/// Winston amounts were once stored as decimal strings; accept both forms
fn winston_amount<'de, D>(deserializer: D) -> std::result::Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    struct WinstonVisitor;

    impl<'de> Visitor<'de> for WinstonVisitor {
        type Value = u128;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a winston amount as an integer or a decimal string")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<u128, E> {
            Ok(u128::from(value))
        }

        fn visit_u128<E: de::Error>(self, value: u128) -> std::result::Result<u128, E> {
            Ok(value)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<u128, E> {
            value
                .trim()
                .parse()
                .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
        }
    }

    deserializer.deserialize_any(WinstonVisitor)
}

/// Wallet address and balance as last seen on the network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub addr: String,
    /// Balance in winston
    #[serde(deserialize_with = "winston_amount")]
    pub balance: u128,
    /// Balance in AR, formatted for display
    #[serde(rename = "balanceAr")]
    pub balance_ar: String,
}

impl Default for WalletSnapshot {
    fn default() -> Self {
        Self::new("", 0)
    }
}

impl WalletSnapshot {
    pub fn new(addr: impl Into<String>, balance: u128) -> Self {
        Self {
            addr: addr.into(),
            balance,
            balance_ar: winston_to_ar(balance),
        }
    }
}

/// Single-file store for the [`WalletSnapshot`]
pub struct SnapshotStore {
    path: PathBuf,
    write_seq: AtomicU64,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_seq: AtomicU64::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the last snapshot; a missing or corrupt file yields the zero-balance default
    pub async fn load(&self) -> WalletSnapshot {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) => {
                debug!(path = ?self.path, error = %e, "No wallet snapshot, using default");
                return WalletSnapshot::default();
            }
        };

        serde_json::from_slice(&contents).unwrap_or_else(|e| {
            warn!(path = ?self.path, error = %e, "Corrupt wallet snapshot, using default");
            WalletSnapshot::default()
        })
    }

    /// Write the snapshot to a hidden sibling and rename it into place,
    /// so a concurrent `load` sees either the old or the new file.
    pub async fn save(&self, snapshot: &WalletSnapshot) -> Result<()> {
        let json = serde_json::to_vec(snapshot).map_err(std::io::Error::from)?;

        let file_name = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(DEFAULT_FILE_NAME);
        let seq = self.write_seq.fetch_add(1, Ordering::Relaxed);
        let temp_path = self
            .path
            .with_file_name(format!(".{}.{}.tmp", file_name, seq));

        tokio::fs::write(&temp_path, json).await?;
        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// Recompute the snapshot from the network and persist it
    pub async fn refresh(&self, adapter: &StorageAdapter) -> Result<WalletSnapshot> {
        let balance = adapter.balance().await?;
        let snapshot = WalletSnapshot::new(adapter.wallet_address(), balance);
        self.save(&snapshot).await?;
        debug!(addr = %snapshot.addr, balance = %snapshot.balance, "Refreshed wallet snapshot");
        Ok(snapshot)
    }
}
