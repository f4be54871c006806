//! Building and signing format 2 transactions

use crate::crypto::{b64url_decode, b64url_encode, deep_hash, sha256, DeepHashItem};
use crate::error::{ArweaveError, Result};
use crate::merkle::{generate_chunks, ChunkedData};
use crate::types::{ChunkUpload, Tag, Transaction};
use crate::wallet::Wallet;

/// A data transaction together with the data and chunk proofs needed to upload it
#[derive(Debug, Clone)]
pub struct PreparedTransaction {
    pub transaction: Transaction,
    data: Vec<u8>,
    chunked: Option<ChunkedData>,
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>> {
    b64url_decode(value)
        .map_err(|e| ArweaveError::Signing(format!("field '{}' is not base64url: {}", name, e)))
}

impl PreparedTransaction {
    /// Create an unsigned data transaction owned by `wallet`
    pub fn new(wallet: &Wallet, data: Vec<u8>, last_tx: String, reward: String) -> Self {
        let chunked = (!data.is_empty()).then(|| generate_chunks(&data));
        let data_root = chunked
            .as_ref()
            .map(|c| b64url_encode(&c.data_root))
            .unwrap_or_default();

        let transaction = Transaction {
            format: 2,
            id: String::new(),
            last_tx,
            owner: wallet.owner().to_string(),
            tags: Vec::new(),
            target: String::new(),
            quantity: "0".to_string(),
            data: String::new(),
            data_size: data.len().to_string(),
            data_root,
            reward,
            signature: String::new(),
        };

        Self {
            transaction,
            data,
            chunked,
        }
    }

    pub fn add_tag(&mut self, name: &str, value: &str) {
        self.transaction.tags.push(Tag {
            name: b64url_encode(name.as_bytes()),
            value: b64url_encode(value.as_bytes()),
        });
    }

    pub fn id(&self) -> &str {
        &self.transaction.id
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn chunk_count(&self) -> usize {
        self.chunked.as_ref().map(|c| c.chunks.len()).unwrap_or(0)
    }

    /// Deep hash of the signed fields
    pub fn signature_data(&self) -> Result<Vec<u8>> {
        let tx = &self.transaction;
        let tags = tx
            .tags
            .iter()
            .map(|tag| -> Result<DeepHashItem> {
                Ok(DeepHashItem::List(vec![
                    DeepHashItem::Blob(decode_field("tag name", &tag.name)?),
                    DeepHashItem::Blob(decode_field("tag value", &tag.value)?),
                ]))
            })
            .collect::<Result<Vec<DeepHashItem>>>()?;

        let item = DeepHashItem::List(vec![
            DeepHashItem::blob(tx.format.to_string()),
            DeepHashItem::Blob(decode_field("owner", &tx.owner)?),
            DeepHashItem::Blob(decode_field("target", &tx.target)?),
            DeepHashItem::blob(tx.quantity.as_str()),
            DeepHashItem::blob(tx.reward.as_str()),
            DeepHashItem::Blob(decode_field("last_tx", &tx.last_tx)?),
            DeepHashItem::List(tags),
            DeepHashItem::blob(tx.data_size.as_str()),
            DeepHashItem::Blob(decode_field("data_root", &tx.data_root)?),
        ]);

        Ok(deep_hash(&item))
    }

    /// Sign with `wallet`; sets `signature` and the derived `id`
    pub fn sign(&mut self, wallet: &Wallet) -> Result<()> {
        if wallet.owner() != self.transaction.owner {
            return Err(ArweaveError::Signing(
                "wallet does not own this transaction".to_string(),
            ));
        }

        let signature = wallet.sign(&self.signature_data()?)?;
        self.transaction.id = b64url_encode(&sha256(&signature));
        self.transaction.signature = b64url_encode(&signature);
        Ok(())
    }

    /// Whether the data fits in the `POST /tx` body
    pub fn uploads_in_body(&self) -> bool {
        self.chunk_count() <= 1
    }

    /// Transaction header for `POST /tx`, carrying the data only when it fits in the body
    pub fn header(&self) -> Transaction {
        let mut header = self.transaction.clone();
        if self.uploads_in_body() {
            header.data = b64url_encode(&self.data);
        }
        header
    }

    /// One `/chunk` body per data chunk
    pub fn chunk_uploads(&self) -> Vec<ChunkUpload> {
        let Some(chunked) = &self.chunked else {
            return Vec::new();
        };

        chunked
            .chunks
            .iter()
            .zip(&chunked.proofs)
            .map(|(chunk, proof)| ChunkUpload {
                data_root: self.transaction.data_root.clone(),
                data_size: self.transaction.data_size.clone(),
                data_path: b64url_encode(&proof.proof),
                offset: proof.offset.to_string(),
                chunk: b64url_encode(&self.data[chunk.min_byte_range..chunk.max_byte_range]),
            })
            .collect()
    }
}
