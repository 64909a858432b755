//! Transaction submission: nonce, ID, signature, send
//!
//! Each call runs the pipeline once. Nothing is retried: a missing nonce
//! aborts before signing, and a gateway that cannot be reached is reported
//! through [`SubmitOutcome::Unreachable`] rather than an error.

use super::builder::{Transaction, TransactionBuilder};
use super::nonce::NonceResolver;
use crate::crypto::{address_from_public_key, CryptoProvider, Secp256k1Provider};
use crate::encoding::{hex_fix, now_timestamp, Clock, SystemClock};
use crate::error::ClientResult;
use crate::gateway::{GatewayClient, Operation, SubmitOutcome};

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Transaction type of a wallet registration
pub const REGISTER_WALLET_TYPE: &str = "C_TYPE_REGISTERWALLET";

/// `Action` carried in a wallet registration payload
pub const REGISTER_WALLET_ACTION: &str = "CP_REGISTERWALLET";

#[derive(Serialize)]
struct RegisterWalletPayload<'a> {
    #[serde(rename = "Action")]
    action: &'a str,
    #[serde(rename = "PublicKey")]
    public_key: &'a str,
}

/// Result of a wallet registration
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    /// ID of the registration transaction
    pub id: String,
    /// Wallet address derived from the public key
    pub address: String,
    pub outcome: SubmitOutcome,
}

/// Builds, signs and submits transactions
#[derive(Clone)]
pub struct TransactionSubmitter {
    client: GatewayClient,
    nonces: NonceResolver,
    crypto: Arc<dyn CryptoProvider>,
    clock: Arc<dyn Clock>,
}

impl TransactionSubmitter {
    /// Create a submitter signing with secp256k1 and the system clock
    pub fn new(client: GatewayClient) -> Self {
        Self {
            nonces: NonceResolver::new(client.clone()),
            client,
            crypto: Arc::new(Secp256k1Provider::new()),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_crypto(mut self, crypto: Arc<dyn CryptoProvider>) -> Self {
        self.crypto = crypto;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn nonce_resolver(&self) -> &NonceResolver {
        &self.nonces
    }

    /// Submit a fully built transaction
    pub async fn submit_raw(&self, tx: &Transaction) -> SubmitOutcome {
        let body = tx.to_request(self.client.version());

        let outcome = self.client.submit(Operation::AddTransaction, body).await;
        match &outcome {
            SubmitOutcome::Response(response) => {
                crate::metrics::record_tx_submitted(&tx.tx_type);
                info!(
                    "Transaction {} submitted (nonce {}, result {})",
                    tx.id, tx.nonce, response.result
                );
            }
            SubmitOutcome::Unparsed { status, .. } => {
                crate::metrics::record_tx_submitted(&tx.tx_type);
                warn!(
                    "Transaction {} got a non-JSON answer (HTTP {})",
                    tx.id, status
                );
            }
            SubmitOutcome::Unreachable { error, .. } => {
                crate::metrics::record_tx_unreachable(&tx.tx_type);
                warn!("Transaction {} not submitted: {}", tx.id, error);
            }
        }

        outcome
    }

    /// Build and sign a transaction from `from` without submitting it
    ///
    /// `payload` is serialized to JSON and hex encoded. The nonce is read from
    /// the gateway once per call; a missing nonce aborts before signing.
    pub async fn prepare<P: Serialize + ?Sized>(
        &self,
        from: &str,
        private_key: &str,
        to: &str,
        tx_type: &str,
        payload: &P,
        blockchain: &str,
    ) -> ClientResult<Transaction> {
        let from = hex_fix(from);
        let to = hex_fix(to);
        let private_key = hex_fix(private_key);
        let blockchain = hex_fix(blockchain);

        let builder = TransactionBuilder::new(blockchain, from, to)
            .tx_type(tx_type)
            .payload_json(payload)?;

        let nonce = self.nonces.resolve_next(blockchain, from).await?;
        let timestamp = now_timestamp(self.clock.as_ref());

        let tx = builder.nonce(nonce).timestamp(timestamp).build();
        debug!("Built transaction {} for wallet {}", tx.id, from);

        tx.sign(self.crypto.as_ref(), private_key)
    }

    /// Build, sign and submit a transaction from `from`
    pub async fn submit_with_private_key<P: Serialize + ?Sized>(
        &self,
        from: &str,
        private_key: &str,
        to: &str,
        tx_type: &str,
        payload: &P,
        blockchain: &str,
    ) -> ClientResult<SubmitOutcome> {
        let tx = self
            .prepare(from, private_key, to, tx_type, payload, blockchain)
            .await?;

        Ok(self.submit_raw(&tx).await)
    }

    /// Register a public key's wallet on a blockchain
    ///
    /// The registration is an unsigned transaction from the wallet to itself
    /// with nonce 0. The submission is awaited.
    pub async fn register_wallet(
        &self,
        blockchain: &str,
        public_key: &str,
    ) -> ClientResult<Registration> {
        let public_key = hex_fix(public_key);
        let address = address_from_public_key(public_key);

        let payload = RegisterWalletPayload {
            action: REGISTER_WALLET_ACTION,
            public_key,
        };

        let tx = TransactionBuilder::new(blockchain, &address, &address)
            .tx_type(REGISTER_WALLET_TYPE)
            .payload_json(&payload)?
            .nonce(0)
            .timestamp(now_timestamp(self.clock.as_ref()))
            .build();

        info!("Registering wallet {} with transaction {}", address, tx.id);
        let outcome = self.submit_raw(&tx).await;

        Ok(Registration {
            id: tx.id,
            address,
            outcome,
        })
    }
}
