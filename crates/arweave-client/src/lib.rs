//! Arweave client
//!
//! Talks to Arweave nodes over HTTP, loads JWK wallets and builds signed
//! format 2 data transactions (chunked with Merkle proofs).
//!
//! # Example
//!
//! ```no_run
//! use arweave_client::{ArweaveClient, StorageNetwork, Wallet};
//!
//! # async fn example() -> Result<(), arweave_client::ArweaveError> {
//! let wallet = Wallet::load("key.store")?;
//! let client = ArweaveClient::new(ArweaveClient::DEFAULT_URL.parse().unwrap())?;
//!
//! let balance = client.balance(wallet.address()).await?;
//! println!("{} AR", arweave_client::winston_to_ar(balance));
//!
//! let tx_id = client.post(&wallet, b"hello".to_vec(), "text/plain").await?;
//! println!("posted {}", tx_id);
//! # Ok(())
//! # }
//! ```

mod client;
mod crypto;
mod error;
mod merkle;
mod network;
mod transaction;
mod types;
mod wallet;

pub use client::ArweaveClient;
pub use error::{ArweaveError, Result};
pub use merkle::{MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};
pub use network::StorageNetwork;
pub use transaction::PreparedTransaction;
pub use types::{
    is_valid_tx_id, winston_to_ar, ChunkUpload, ConfirmedStatus, NetworkInfo, Tag, Transaction,
    TransactionStatus, TX_ID_LENGTH, WINSTON_PER_AR,
};
pub use wallet::{Jwk, Wallet};
