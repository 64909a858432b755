//! Wallet nonce resolution
//!
//! The gateway owns every wallet nonce. Each lookup is a fresh round trip
//! with no local tracking, so two submissions racing for the same wallet can
//! both be handed the same "next" nonce; the gateway then accepts one and
//! rejects the other. Callers that submit concurrently from one wallet must
//! serialize those submissions themselves.

use crate::error::{ClientError, ClientResult};
use crate::gateway::GatewayClient;

use serde_json::Value;
use tracing::{debug, warn};

/// Reads wallet nonces from the gateway
#[derive(Clone)]
pub struct NonceResolver {
    client: GatewayClient,
}

impl NonceResolver {
    pub fn new(client: GatewayClient) -> Self {
        Self { client }
    }

    /// Current nonce stored by the gateway
    pub async fn current(&self, blockchain: &str, address: &str) -> ClientResult<u64> {
        let response = self.client.get_wallet_nonce(blockchain, address).await?;

        match response.response.get("Nonce").and_then(Value::as_u64) {
            Some(nonce) => {
                crate::metrics::record_nonce_lookup(true);
                Ok(nonce)
            }
            None => {
                crate::metrics::record_nonce_lookup(false);
                warn!(
                    "No nonce for wallet {} (result {})",
                    address, response.result
                );
                Err(ClientError::NonceNotFound {
                    blockchain: blockchain.to_string(),
                    address: address.to_string(),
                })
            }
        }
    }

    /// Nonce to use for the wallet's next transaction
    pub async fn resolve_next(&self, blockchain: &str, address: &str) -> ClientResult<u64> {
        let current = self.current(blockchain, address).await?;
        let next = current
            .checked_add(1)
            .ok_or_else(|| ClientError::Internal(format!("Nonce overflow for {}", address)))?;

        debug!("Resolved nonce {} for wallet {}", next, address);
        Ok(next)
    }
}
