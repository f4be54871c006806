//! Arweave wire types

use serde::{Deserialize, Serialize};

/// Number of winston in one AR
pub const WINSTON_PER_AR: u128 = 1_000_000_000_000;

/// Length of a base64url transaction id (32 bytes, unpadded)
pub const TX_ID_LENGTH: usize = 43;

/// Node information from `GET /info`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkInfo {
    #[serde(default)]
    pub network: String,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub release: u64,
    #[serde(default)]
    pub height: u64,
    #[serde(default)]
    pub current: String,
    #[serde(default)]
    pub blocks: u64,
    #[serde(default)]
    pub peers: u64,
    #[serde(default)]
    pub queue_length: u64,
}

/// Block data for a mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedStatus {
    pub block_height: u64,
    pub block_indep_hash: String,
    pub number_of_confirmations: u64,
}

/// Confirmation state of a transaction.
///
/// `status` is the HTTP status the node answered with (200 mined, 202 pending).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionStatus {
    pub status: u16,
    pub confirmed: Option<ConfirmedStatus>,
}

impl TransactionStatus {
    pub fn pending() -> Self {
        Self {
            status: 202,
            confirmed: None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed.is_some()
    }
}

/// A transaction tag; name and value are base64url encoded on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

/// Format 2 transaction as posted to `POST /tx`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transaction {
    pub format: u8,
    pub id: String,
    pub last_tx: String,
    pub owner: String,
    pub tags: Vec<Tag>,
    pub target: String,
    pub quantity: String,
    pub data: String,
    pub data_size: String,
    pub data_root: String,
    pub reward: String,
    pub signature: String,
}

/// Body of `POST /chunk`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkUpload {
    pub data_root: String,
    pub data_size: String,
    pub data_path: String,
    pub offset: String,
    pub chunk: String,
}

/// Check that an id looks like an Arweave transaction id
pub fn is_valid_tx_id(id: &str) -> bool {
    id.len() == TX_ID_LENGTH
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Convert a winston amount to an AR display string with trailing zeros trimmed
pub fn winston_to_ar(winston: u128) -> String {
    let whole = winston / WINSTON_PER_AR;
    let fraction = winston % WINSTON_PER_AR;
    if fraction == 0 {
        return whole.to_string();
    }

    let fraction = format!("{:012}", fraction);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}
