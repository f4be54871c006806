//! The storage network boundary

use crate::client::ArweaveClient;
use crate::error::Result;
use crate::types::TransactionStatus;
use crate::wallet::Wallet;
use async_trait::async_trait;

/// Operations the gateway needs from one storage network node.
///
/// Implement this trait to plug in another node client or an in-memory
/// network for tests.
#[async_trait]
pub trait StorageNetwork: Send + Sync {
    /// Balance of `address` in winston
    async fn balance(&self, address: &str) -> Result<u128>;

    /// Confirmation state of a transaction
    async fn status(&self, tx_id: &str) -> Result<TransactionStatus>;

    /// Transaction data, or `None` if this node returned nothing
    async fn data(&self, tx_id: &str) -> Result<Option<Vec<u8>>>;

    /// Create, sign and upload a data transaction; returns its id
    async fn post(&self, wallet: &Wallet, data: Vec<u8>, content_type: &str) -> Result<String>;
}

#[async_trait]
impl StorageNetwork for ArweaveClient {
    async fn balance(&self, address: &str) -> Result<u128> {
        self.wallet_balance(address).await
    }

    async fn status(&self, tx_id: &str) -> Result<TransactionStatus> {
        self.transaction_status(tx_id).await
    }

    async fn data(&self, tx_id: &str) -> Result<Option<Vec<u8>>> {
        self.transaction_data(tx_id).await
    }

    async fn post(&self, wallet: &Wallet, data: Vec<u8>, content_type: &str) -> Result<String> {
        self.submit(wallet, data, content_type).await
    }
}
