//! Circular client - submit and track transactions through a network access gateway
//!
//! The gateway exposes every ledger operation as a JSON POST. This crate wraps
//! those operations, builds and signs transactions with secp256k1, and polls
//! for finality.

pub mod config;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod tx;

pub use config::{FinalityConfig, GatewayConfig, Settings, WalletConfig};
pub use crypto::{CryptoProvider, Secp256k1Provider};
pub use error::{ClientError, ClientResult};
pub use gateway::{FinalityPoller, GatewayClient, GatewayResponse, Operation, SubmitOutcome};
pub use tx::{NonceResolver, Transaction, TransactionBuilder, TransactionSubmitter};
