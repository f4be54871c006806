use crate::error::{GatewayError, Result};
use std::env;
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_NODE_URL: &str = "https://arweave.net";
pub const DEFAULT_EXPLORER_URL: &str = "https://viewblock.io/arweave/address/";

/// Gateway configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    pub cache_dir: PathBuf,
    pub key_file: PathBuf,
    pub stats_file: PathBuf,
    pub primary_node: Url,
    pub backup_node: Url,
    pub network_timeout_secs: u64,
    pub max_upload_size: usize,
    /// Prefix the wallet address is appended to on the status page
    pub explorer_url: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let node = Url::parse(DEFAULT_NODE_URL).expect("default node URL is valid");
        Self {
            port: 3001,
            cache_dir: PathBuf::from("./cache"),
            key_file: PathBuf::from("./key.store"),
            stats_file: PathBuf::from("./stats-cache.json"),
            primary_node: node.clone(),
            backup_node: node,
            network_timeout_secs: 30,
            max_upload_size: 3 * 1024 * 1024, // 3 MiB
            explorer_url: DEFAULT_EXPLORER_URL.to_string(),
        }
    }
}

fn parse_node_url(var: &str, default: &Url) -> Result<Url> {
    match env::var(var) {
        Ok(value) => Url::parse(&value)
            .map_err(|e| GatewayError::Config(format!("invalid {}: {}", var, e))),
        Err(_) => Ok(default.clone()),
    }
}

impl GatewayConfig {
    /// Parse configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(defaults.port);

        let cache_dir = env::var("CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_dir);

        let key_file = env::var("KEY_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.key_file);

        let stats_file = env::var("STATS_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.stats_file);

        let primary_node = parse_node_url("PRIMARY_NODE_URL", &defaults.primary_node)?;
        let backup_node = parse_node_url("BACKUP_NODE_URL", &defaults.backup_node)?;

        let network_timeout_secs = env::var("NETWORK_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.network_timeout_secs);

        let max_upload_size = env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.max_upload_size);

        let explorer_url = env::var("EXPLORER_URL").unwrap_or(defaults.explorer_url);

        Ok(Self {
            port,
            cache_dir,
            key_file,
            stats_file,
            primary_node,
            backup_node,
            network_timeout_secs,
            max_upload_size,
            explorer_url,
        })
    }
}
