//! Status page rendering
//!
//! One renderer for the home page and its error fallback, backed by askama
//! templates compiled into the binary.

use crate::error::Result;
use crate::snapshot::WalletSnapshot;
use askama::Template;
use bytesize::ByteSize;
use chrono::{DateTime, Local};
use file_blob_cache::CacheIndex;

/// One cached transaction row
pub struct EntryRow {
    pub tx_id: String,
    pub size: String,
    pub updated: String,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct StatusPage {
    pub address: String,
    /// Trusted prefix from configuration, emitted unescaped
    pub explorer_url: String,
    pub balance: String,
    pub balance_ar: String,
    pub entry_count: usize,
    pub total_size: String,
    pub entries: Vec<EntryRow>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage;

const FALLBACK_ERROR_PAGE: &str =
    "<!DOCTYPE html><html><body><h1>Something went wrong.</h1></body></html>";

fn format_time(time: DateTime<chrono::Utc>) -> String {
    let local: DateTime<Local> = time.into();
    local.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Renders the gateway's HTML pages
#[derive(Debug, Clone)]
pub struct PageRenderer {
    explorer_url: String,
}

impl PageRenderer {
    pub fn new(explorer_url: impl Into<String>) -> Self {
        Self {
            explorer_url: explorer_url.into(),
        }
    }

    pub fn status_page(&self, snapshot: &WalletSnapshot, listing: &CacheIndex) -> StatusPage {
        let entries = listing
            .entries()
            .map(|entry| EntryRow {
                tx_id: entry.key.clone(),
                size: ByteSize::b(entry.size).to_string(),
                updated: format_time(entry.modified),
            })
            .collect();

        StatusPage {
            address: snapshot.addr.clone(),
            explorer_url: self.explorer_url.clone(),
            balance: snapshot.balance.to_string(),
            balance_ar: snapshot.balance_ar.clone(),
            entry_count: listing.len(),
            total_size: ByteSize::b(listing.total_size()).to_string(),
            entries,
        }
    }

    /// Home page HTML for a wallet snapshot and cache listing
    pub fn render_status(&self, snapshot: &WalletSnapshot, listing: &CacheIndex) -> Result<String> {
        Ok(self.status_page(snapshot, listing).render()?)
    }

    /// Generic error page; never fails
    pub fn render_error(&self) -> String {
        ErrorPage
            .render()
            .unwrap_or_else(|_| FALLBACK_ERROR_PAGE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use file_blob_cache::CacheEntry;

    fn listing() -> CacheIndex {
        let mut index = CacheIndex::new();
        index.record(CacheEntry {
            key: "bNbA3TEQVL60xlgCcqdz4ZPHFZ711cZ3hmkpGttDt_U".to_string(),
            size: 2048,
            modified: Utc::now(),
        });
        index
    }

    #[test]
    fn test_status_page_fields() {
        let renderer = PageRenderer::new("https://viewblock.io/arweave/address/");
        let snapshot = WalletSnapshot::new("walletaddr", 1_500_000_000_000);

        let page = renderer.status_page(&snapshot, &listing());
        assert_eq!(page.explorer_url, "https://viewblock.io/arweave/address/");
        assert_eq!(page.address, "walletaddr");
        assert_eq!(page.balance, "1500000000000");
        assert_eq!(page.balance_ar, "1.5");
        assert_eq!(page.entry_count, 1);
        assert_eq!(page.entries[0].updated.len(), "2024-01-01 00:00:00".len());
    }

    #[test]
    fn test_render_status_contains_listing() {
        let renderer = PageRenderer::new("https://explorer/");
        let html = renderer
            .render_status(&WalletSnapshot::new("walletaddr", 0), &listing())
            .unwrap();

        assert!(html.contains("https://explorer/walletaddr"));
        assert!(html.contains("/tx/bNbA3TEQVL60xlgCcqdz4ZPHFZ711cZ3hmkpGttDt_U"));
        assert!(html.contains("data-tx-id=\"bNbA3TEQVL60xlgCcqdz4ZPHFZ711cZ3hmkpGttDt_U\""));
        assert!(html.contains("/status/"));
    }

    #[test]
    fn test_render_status_escapes_address() {
        let renderer = PageRenderer::new("https://explorer/");
        let html = renderer
            .render_status(&WalletSnapshot::new("<script>", 0), &CacheIndex::new())
            .unwrap();

        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_render_empty_cache() {
        let renderer = PageRenderer::new("https://explorer/");
        let html = renderer
            .render_status(&WalletSnapshot::default(), &CacheIndex::new())
            .unwrap();

        assert!(html.contains("No cached transactions"));
    }

    #[test]
    fn test_render_error_page() {
        let html = PageRenderer::new("").render_error();
        assert!(html.contains("Something went wrong"));
    }
}
