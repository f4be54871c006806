//! Storage client adapter: cache-first reads and write-through uploads

use crate::error::{GatewayError, Result};
use arweave_client::{is_valid_tx_id, StorageNetwork, TransactionStatus, Wallet};
use file_blob_cache::BlobCache;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Transaction data and where it came from
#[derive(Debug)]
pub struct Fetched {
    pub data: Vec<u8>,
    pub from_cache: bool,
}

/// Wraps the storage network nodes, the wallet and the local content cache
pub struct StorageAdapter {
    wallet: Arc<Wallet>,
    primary: Arc<dyn StorageNetwork>,
    backup: Arc<dyn StorageNetwork>,
    cache: Arc<BlobCache>,
}

impl StorageAdapter {
    pub fn new(
        wallet: Arc<Wallet>,
        primary: Arc<dyn StorageNetwork>,
        backup: Arc<dyn StorageNetwork>,
        cache: Arc<BlobCache>,
    ) -> Self {
        Self {
            wallet,
            primary,
            backup,
            cache,
        }
    }

    pub fn wallet_address(&self) -> &str {
        self.wallet.address()
    }

    pub fn cache(&self) -> &BlobCache {
        &self.cache
    }

    /// Wallet balance in winston
    pub async fn balance(&self) -> Result<u128> {
        Ok(self.primary.balance(self.wallet.address()).await?)
    }

    pub async fn status(&self, tx_id: &str) -> Result<TransactionStatus> {
        if !is_valid_tx_id(tx_id) {
            return Err(GatewayError::NotFound(tx_id.to_string()));
        }
        Ok(self.primary.status(tx_id).await?)
    }

    /// Cache first, then the primary node, then the backup node if the
    /// primary returned nothing.
    pub async fn data(&self, tx_id: &str) -> Result<Fetched> {
        if !is_valid_tx_id(tx_id) {
            return Err(GatewayError::NotFound(tx_id.to_string()));
        }

        match self.cache.read(tx_id).await {
            Ok(Some(data)) => {
                debug!(tx_id, "Serving data from cache");
                return Ok(Fetched {
                    data,
                    from_cache: true,
                });
            }
            Ok(None) => {}
            Err(e) => warn!(tx_id, error = %e, "Cache read failed, fetching from network"),
        }

        let started = Instant::now();
        let data = match self.primary.data(tx_id).await? {
            Some(data) if !data.is_empty() => data,
            _ => {
                info!(tx_id, "Primary node returned nothing, trying backup");
                match self.backup.data(tx_id).await? {
                    Some(data) if !data.is_empty() => data,
                    _ => return Err(GatewayError::NotFound(tx_id.to_string())),
                }
            }
        };
        info!(
            tx_id,
            size = data.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetched data from network"
        );

        self.write_through(tx_id.to_string(), data.clone());
        Ok(Fetched {
            data,
            from_cache: false,
        })
    }

    /// Sign and upload `data`, then cache it under the new transaction id
    pub async fn post(&self, data: Vec<u8>, content_type: &str) -> Result<String> {
        let tx_id = self
            .primary
            .post(&self.wallet, data.clone(), content_type)
            .await?;
        self.write_through(tx_id.clone(), data);
        Ok(tx_id)
    }

    /// Cache `data` in a detached task; failures are only logged
    fn write_through(&self, tx_id: String, data: Vec<u8>) {
        let cache = Arc::clone(&self.cache);
        tokio::spawn(async move {
            match cache.write(&tx_id, &data).await {
                Ok(()) => debug!(tx_id = %tx_id, "Write cache success"),
                Err(e) => warn!(tx_id = %tx_id, error = %e, "Write cache failed"),
            }
        });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use arweave_client::{ArweaveError, ConfirmedStatus};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::tempdir;

    pub const TX_ID: &str = "bNbA3TEQVL60xlgCcqdz4ZPHFZ711cZ3hmkpGttDt_U";

    /// In-memory network node that counts every call
    #[derive(Default)]
    pub struct MockNetwork {
        pub blobs: Mutex<HashMap<String, Vec<u8>>>,
        pub calls: AtomicUsize,
        pub fail: bool,
        /// Delay before answering a balance query
        pub balance_delay: Option<Duration>,
    }

    impl MockNetwork {
        pub fn with_blob(tx_id: &str, data: &[u8]) -> Self {
            let network = Self::default();
            network
                .blobs
                .lock()
                .unwrap()
                .insert(tx_id.to_string(), data.to_vec());
            network
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn slow(balance_delay: Duration) -> Self {
            Self {
                balance_delay: Some(balance_delay),
                ..Self::default()
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn call(&self) -> arweave_client::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ArweaveError::Api {
                    status: 502,
                    message: "bad gateway".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl StorageNetwork for MockNetwork {
        async fn balance(&self, _address: &str) -> arweave_client::Result<u128> {
            self.call()?;
            if let Some(delay) = self.balance_delay {
                tokio::time::sleep(delay).await;
            }
            Ok(1_500_000_000_000)
        }

        async fn status(&self, tx_id: &str) -> arweave_client::Result<TransactionStatus> {
            self.call()?;
            if !self.blobs.lock().unwrap().contains_key(tx_id) {
                return Err(ArweaveError::NotFound(tx_id.to_string()));
            }
            Ok(TransactionStatus {
                status: 200,
                confirmed: Some(ConfirmedStatus {
                    block_height: 1_000_000,
                    block_indep_hash: "block".to_string(),
                    number_of_confirmations: 25,
                }),
            })
        }

        async fn data(&self, tx_id: &str) -> arweave_client::Result<Option<Vec<u8>>> {
            self.call()?;
            Ok(self.blobs.lock().unwrap().get(tx_id).cloned())
        }

        async fn post(
            &self,
            _wallet: &Wallet,
            data: Vec<u8>,
            _content_type: &str,
        ) -> arweave_client::Result<String> {
            self.call()?;
            self.blobs.lock().unwrap().insert(TX_ID.to_string(), data);
            Ok(TX_ID.to_string())
        }
    }

    pub fn test_wallet() -> Arc<Wallet> {
        Arc::new(Wallet::generate(1024).unwrap())
    }

    /// Poll until a detached write-through has landed
    pub async fn wait_for_cache(cache: &BlobCache, key: &str) {
        for _ in 0..100 {
            if cache.has(key).await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("cache entry {} never written", key);
    }

    async fn adapter(
        dir: &std::path::Path,
        primary: Arc<MockNetwork>,
        backup: Arc<MockNetwork>,
    ) -> StorageAdapter {
        let cache = Arc::new(BlobCache::new(dir.join("cache")));
        cache.init().await.unwrap();
        StorageAdapter::new(test_wallet(), primary, backup, cache)
    }

    #[tokio::test]
    async fn test_data_from_primary_is_written_through() {
        let dir = tempdir().unwrap();
        let primary = Arc::new(MockNetwork::with_blob(TX_ID, b"payload"));
        let backup = Arc::new(MockNetwork::default());
        let adapter = adapter(dir.path(), primary.clone(), backup.clone()).await;

        let fetched = adapter.data(TX_ID).await.unwrap();
        assert_eq!(fetched.data, b"payload");
        assert!(!fetched.from_cache);
        assert_eq!(backup.calls(), 0);

        wait_for_cache(adapter.cache(), TX_ID).await;
        let again = adapter.data(TX_ID).await.unwrap();
        assert!(again.from_cache);
        assert_eq!(again.data, b"payload");
        assert_eq!(primary.calls(), 1);
    }

    #[tokio::test]
    async fn test_data_falls_back_to_backup() {
        let dir = tempdir().unwrap();
        let primary = Arc::new(MockNetwork::default());
        let backup = Arc::new(MockNetwork::with_blob(TX_ID, b"from backup"));
        let adapter = adapter(dir.path(), primary.clone(), backup.clone()).await;

        let fetched = adapter.data(TX_ID).await.unwrap();
        assert_eq!(fetched.data, b"from backup");
        assert_eq!(primary.calls(), 1);
        assert_eq!(backup.calls(), 1);
    }

    #[tokio::test]
    async fn test_data_not_found_on_either_node() {
        let dir = tempdir().unwrap();
        let adapter = adapter(
            dir.path(),
            Arc::new(MockNetwork::default()),
            Arc::new(MockNetwork::default()),
        )
        .await;

        let err = adapter.data(TX_ID).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_primary_transport_failure_is_network_error() {
        let dir = tempdir().unwrap();
        let backup = Arc::new(MockNetwork::with_blob(TX_ID, b"unused"));
        let adapter = adapter(dir.path(), Arc::new(MockNetwork::failing()), backup.clone()).await;

        let err = adapter.data(TX_ID).await.unwrap_err();
        assert!(matches!(err, GatewayError::Network(_)));
        assert_eq!(backup.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_id_never_reaches_network() {
        let dir = tempdir().unwrap();
        let primary = Arc::new(MockNetwork::default());
        let adapter = adapter(dir.path(), primary.clone(), Arc::new(MockNetwork::default())).await;

        assert!(matches!(
            adapter.data("../key.store").await.unwrap_err(),
            GatewayError::NotFound(_)
        ));
        assert!(matches!(
            adapter.status("short").await.unwrap_err(),
            GatewayError::NotFound(_)
        ));
        assert_eq!(primary.calls(), 0);
    }

    #[tokio::test]
    async fn test_post_writes_through() {
        let dir = tempdir().unwrap();
        let primary = Arc::new(MockNetwork::default());
        let adapter = adapter(dir.path(), primary.clone(), Arc::new(MockNetwork::default())).await;

        let tx_id = adapter.post(b"image".to_vec(), "image/png").await.unwrap();
        assert_eq!(tx_id, TX_ID);

        wait_for_cache(adapter.cache(), TX_ID).await;
        assert_eq!(
            adapter.cache().read(TX_ID).await.unwrap(),
            Some(b"image".to_vec())
        );
    }

    #[tokio::test]
    async fn test_balance_uses_wallet_address() {
        let dir = tempdir().unwrap();
        let adapter = adapter(
            dir.path(),
            Arc::new(MockNetwork::default()),
            Arc::new(MockNetwork::default()),
        )
        .await;

        assert_eq!(adapter.balance().await.unwrap(), 1_500_000_000_000);
        assert_eq!(adapter.wallet_address().len(), 43);
    }
}
