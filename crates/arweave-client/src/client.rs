//! HTTP client for a single Arweave node

use crate::error::{ArweaveError, Result};
use crate::transaction::PreparedTransaction;
use crate::types::{ConfirmedStatus, NetworkInfo, TransactionStatus};
use crate::wallet::Wallet;
use reqwest::{Client, Response, StatusCode};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Client for one Arweave node (or gateway) base URL
pub struct ArweaveClient {
    http: Client,
    base_url: Url,
}

impl ArweaveClient {
    pub const DEFAULT_URL: &'static str = "https://arweave.net";

    /// Create a client with the default 30 second timeout
    pub fn new(base_url: Url) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    pub fn with_timeout(base_url: Url, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    async fn error_from(response: Response) -> ArweaveError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        ArweaveError::Api { status, message }
    }

    async fn get_text(&self, path: &str) -> Result<String> {
        let url = self.endpoint(path);
        debug!(url = %url, "GET");
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(response.text().await?)
    }

    /// `GET /info`
    pub async fn network_info(&self) -> Result<NetworkInfo> {
        let response = self.http.get(self.endpoint("info")).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(response.json().await?)
    }

    /// Balance of `address` in winston
    pub async fn wallet_balance(&self, address: &str) -> Result<u128> {
        let body = self.get_text(&format!("wallet/{}/balance", address)).await?;
        body.trim().parse::<u128>().map_err(|_| ArweaveError::Api {
            status: 200,
            message: format!("unparseable balance '{}'", body.trim()),
        })
    }

    /// `GET /tx/{id}/status`
    pub async fn transaction_status(&self, tx_id: &str) -> Result<TransactionStatus> {
        let url = self.endpoint(&format!("tx/{}/status", tx_id));
        debug!(tx_id, url = %url, "Fetching transaction status");
        let response = self.http.get(&url).send().await?;

        match response.status() {
            StatusCode::OK => {
                let confirmed: ConfirmedStatus = response.json().await?;
                Ok(TransactionStatus {
                    status: 200,
                    confirmed: Some(confirmed),
                })
            }
            StatusCode::ACCEPTED => Ok(TransactionStatus::pending()),
            StatusCode::NOT_FOUND => Err(ArweaveError::NotFound(tx_id.to_string())),
            _ => Err(Self::error_from(response).await),
        }
    }

    /// Raw transaction data; `None` when the node has nothing for this id
    pub async fn transaction_data(&self, tx_id: &str) -> Result<Option<Vec<u8>>> {
        let url = self.endpoint(tx_id);
        debug!(tx_id, url = %url, "Fetching transaction data");
        let response = self.http.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            warn!(tx_id, status = %response.status(), "Node failed to serve data");
            return Err(Self::error_from(response).await);
        }

        let data = response.bytes().await?;
        Ok((!data.is_empty()).then(|| data.to_vec()))
    }

    /// Anchor to use as `last_tx` for a new transaction
    pub async fn tx_anchor(&self) -> Result<String> {
        Ok(self.get_text("tx_anchor").await?.trim().to_string())
    }

    /// Reward in winston for storing `bytes` bytes
    pub async fn price(&self, bytes: usize) -> Result<String> {
        Ok(self
            .get_text(&format!("price/{}", bytes))
            .await?
            .trim()
            .to_string())
    }

    /// Create and sign a data transaction tagged with its content type
    pub async fn create_transaction(
        &self,
        wallet: &Wallet,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<PreparedTransaction> {
        let last_tx = self.tx_anchor().await?;
        let reward = self.price(data.len()).await?;

        let mut tx = PreparedTransaction::new(wallet, data, last_tx, reward);
        tx.add_tag("Content-Type", content_type);
        tx.sign(wallet)?;
        Ok(tx)
    }

    /// Post the transaction header, then every chunk the body could not carry
    pub async fn upload(&self, tx: &PreparedTransaction) -> Result<String> {
        let response = self
            .http
            .post(self.endpoint("tx"))
            .json(&tx.header())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        if !tx.uploads_in_body() {
            let uploads = tx.chunk_uploads();
            let total = uploads.len();
            for (index, chunk) in uploads.iter().enumerate() {
                let response = self
                    .http
                    .post(self.endpoint("chunk"))
                    .json(chunk)
                    .send()
                    .await?;
                if !response.status().is_success() {
                    return Err(Self::error_from(response).await);
                }
                debug!(tx_id = tx.id(), chunk = index + 1, total, "Uploaded chunk");
            }
        }

        Ok(tx.id().to_string())
    }

    /// Create, sign and upload `data`, returning the transaction id
    pub async fn submit(
        &self,
        wallet: &Wallet,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        let started = Instant::now();
        let tx = self.create_transaction(wallet, data, content_type).await?;
        let tx_id = self.upload(&tx).await?;
        info!(
            tx_id = %tx_id,
            size = tx.data().len(),
            chunks = tx.chunk_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Posted transaction"
        );
        Ok(tx_id)
    }
}
