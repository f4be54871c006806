//! Error types for the Arweave gateway

use arweave_client::ArweaveError;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum GatewayError {
    KeyMissing(PathBuf),
    KeyInvalid(String),
    Network(String),
    NotFound(String),
    /// Rejected upload; the message is shown to the client verbatim
    Validation(String),
    Signing(String),
    Io(Box<std::io::Error>),
    Render(askama::Error),
    Config(String),
}

impl GatewayError {
    /// Text safe to return to HTTP clients
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Validation(msg) => msg.clone(),
            GatewayError::NotFound(_) => "Transaction not found.".to_string(),
            GatewayError::Network(_) => "Network request failed.".to_string(),
            GatewayError::Signing(_) => "Failed to sign transaction.".to_string(),
            _ => "Internal error.".to_string(),
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::KeyMissing(path) => {
                write!(f, "Arweave keystore not found: {}", path.display())
            }
            GatewayError::KeyInvalid(msg) => write!(f, "Invalid Arweave keystore: {}", msg),
            GatewayError::Network(msg) => write!(f, "Network error: {}", msg),
            GatewayError::NotFound(id) => write!(f, "Not found: {}", id),
            GatewayError::Validation(msg) => write!(f, "{}", msg),
            GatewayError::Signing(msg) => write!(f, "Signing error: {}", msg),
            GatewayError::Io(err) => write!(f, "IO error: {}", err),
            GatewayError::Render(err) => write!(f, "Render error: {}", err),
            GatewayError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for GatewayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GatewayError::Io(err) => Some(err.as_ref()),
            GatewayError::Render(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ArweaveError> for GatewayError {
    fn from(err: ArweaveError) -> Self {
        match err {
            ArweaveError::KeyMissing(path) => GatewayError::KeyMissing(path),
            ArweaveError::KeyInvalid(msg) => GatewayError::KeyInvalid(msg),
            ArweaveError::NotFound(id) => GatewayError::NotFound(id),
            ArweaveError::Signing(msg) => GatewayError::Signing(msg),
            other => GatewayError::Network(other.to_string()),
        }
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::Io(Box::new(err))
    }
}

impl From<askama::Error> for GatewayError {
    fn from(err: askama::Error) -> Self {
        GatewayError::Render(err)
    }
}

impl From<tracing_subscriber::filter::ParseError> for GatewayError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        GatewayError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = GatewayError::Validation("File type invalid.".to_string());
        assert_eq!(format!("{}", err), "File type invalid.");
        assert_eq!(err.user_message(), "File type invalid.");
    }

    #[test]
    fn test_network_message_is_generic() {
        let err = GatewayError::Network("connection refused to 10.0.0.1".to_string());
        assert_eq!(err.user_message(), "Network request failed.");
    }

    #[test]
    fn test_arweave_error_mapping() {
        let err: GatewayError = ArweaveError::NotFound("abc".to_string()).into();
        assert!(matches!(err, GatewayError::NotFound(_)));

        let err: GatewayError = ArweaveError::Api {
            status: 500,
            message: "boom".to_string(),
        }
        .into();
        assert!(matches!(err, GatewayError::Network(_)));

        let err: GatewayError = ArweaveError::KeyMissing(PathBuf::from("key.store")).into();
        assert!(matches!(err, GatewayError::KeyMissing(_)));
    }

    #[test]
    fn test_config_error_display() {
        let err = GatewayError::Config("invalid PRIMARY_NODE_URL".to_string());
        assert_eq!(
            format!("{}", err),
            "Configuration error: invalid PRIMARY_NODE_URL"
        );
    }
}
