//! Error types for the Arweave client

use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ArweaveError {
    /// The wallet key file does not exist
    KeyMissing(PathBuf),
    /// The wallet key file exists but is not a usable RSA JWK
    KeyInvalid(String),
    /// Transport failure (connect, timeout, body read)
    Http(Box<reqwest::Error>),
    /// The node answered with an unexpected status
    Api { status: u16, message: String },
    /// The node does not know the requested transaction
    NotFound(String),
    Signing(String),
    Json(serde_json::Error),
}

impl ArweaveError {
    /// Whether this failure came from talking to a node
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            ArweaveError::Http(_) | ArweaveError::Api { .. } | ArweaveError::Json(_)
        )
    }
}

impl fmt::Display for ArweaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArweaveError::KeyMissing(path) => {
                write!(f, "Arweave keystore not found: {}", path.display())
            }
            ArweaveError::KeyInvalid(msg) => write!(f, "Invalid Arweave keystore: {}", msg),
            ArweaveError::Http(err) => write!(f, "HTTP error: {}", err),
            ArweaveError::Api { status, message } => {
                write!(f, "Node returned status {}: {}", status, message)
            }
            ArweaveError::NotFound(id) => write!(f, "Transaction not found: {}", id),
            ArweaveError::Signing(msg) => write!(f, "Signing error: {}", msg),
            ArweaveError::Json(err) => write!(f, "JSON error: {}", err),
        }
    }
}

impl std::error::Error for ArweaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArweaveError::Http(err) => Some(err.as_ref()),
            ArweaveError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ArweaveError {
    fn from(err: reqwest::Error) -> Self {
        ArweaveError::Http(Box::new(err))
    }
}

impl From<serde_json::Error> for ArweaveError {
    fn from(err: serde_json::Error) -> Self {
        ArweaveError::Json(err)
    }
}

pub type Result<T> = std::result::Result<T, ArweaveError>;
