//! Error types for the Circular gateway client

use thiserror::Error;

/// Main error type for the client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The gateway could not be reached, or answered with a non-success HTTP status
    #[error("Network error calling {operation}: {message}")]
    Network { operation: String, message: String },

    /// The gateway answered, but the body was not JSON
    #[error("Error parsing response data from {operation}: {message}")]
    Parse { operation: String, message: String },

    #[error("Gateway returned result {code}: {message}")]
    Gateway { code: i64, message: String },

    #[error("Nonce not found for wallet {address} on blockchain {blockchain}")]
    NonceNotFound { blockchain: String, address: String },

    #[error("Timeout exceeded waiting {timeout_secs}s for transaction {tx_id}")]
    Timeout { tx_id: String, timeout_secs: u64 },

    #[error("Polling for transaction {tx_id} was cancelled")]
    Cancelled { tx_id: String },

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Check if the caller may reasonably retry the operation
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Network { .. } | ClientError::Timeout { .. }
        )
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let network = ClientError::Network {
            operation: "Circular_GetBlock_".to_string(),
            message: "connection refused".to_string(),
        };
        let nonce = ClientError::NonceNotFound {
            blockchain: "aa".to_string(),
            address: "bb".to_string(),
        };

        assert!(network.is_retryable());
        assert!(!nonce.is_retryable());
        assert!(nonce.to_string().contains("bb"));
    }
}
