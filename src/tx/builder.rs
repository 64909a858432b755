//! Transaction assembly and the canonical transaction ID
//!
//! The ID is `SHA256(blockchain ++ from ++ to ++ payload ++ nonce ++ timestamp)`
//! over the normalized hex fields, with no separators. The gateway recomputes
//! it byte for byte, so neither the order nor the encoding may change.

use crate::crypto::{sha256_hex, CryptoProvider};
use crate::encoding::{hex_fix, now_timestamp, string_to_hex, SystemClock};
use crate::error::ClientResult;

use serde::Serialize;
use serde_json::{json, Value};

/// Canonical transaction ID
pub fn build_id(
    blockchain: &str,
    from: &str,
    to: &str,
    payload_hex: &str,
    nonce: u64,
    timestamp: &str,
) -> String {
    let preimage = format!(
        "{}{}{}{}{}{}",
        hex_fix(blockchain),
        hex_fix(from),
        hex_fix(to),
        hex_fix(payload_hex),
        nonce,
        timestamp
    );
    sha256_hex(&preimage)
}

/// A transaction as the gateway stores it; hex fields carry no `0x`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: String,
    pub from: String,
    pub to: String,
    pub timestamp: String,
    pub tx_type: String,
    pub payload: String,
    pub nonce: u64,
    pub signature: String,
    pub blockchain: String,
}

impl Transaction {
    /// Sign the ID with `private_key`
    pub fn sign(self, crypto: &dyn CryptoProvider, private_key: &str) -> ClientResult<Self> {
        let signature = crypto.sign(&self.id, private_key)?;
        Ok(self.with_signature(signature))
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = hex_fix(&signature.into()).to_string();
        self
    }

    /// True when the stored ID matches the other fields
    pub fn id_matches(&self) -> bool {
        self.id
            == build_id(
                &self.blockchain,
                &self.from,
                &self.to,
                &self.payload,
                self.nonce,
                &self.timestamp,
            )
    }

    /// Body of the add-transaction request
    pub fn to_request(&self, version: &str) -> Value {
        json!({
            "ID": hex_fix(&self.id),
            "From": hex_fix(&self.from),
            "To": hex_fix(&self.to),
            "Timestamp": self.timestamp,
            "Payload": hex_fix(&self.payload),
            "Nonce": self.nonce.to_string(),
            "Signature": hex_fix(&self.signature),
            "Blockchain": hex_fix(&self.blockchain),
            "Type": self.tx_type,
            "Version": version,
        })
    }
}

/// Builds unsigned transactions with their canonical ID
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    blockchain: String,
    from: String,
    to: String,
    tx_type: String,
    payload: String,
    nonce: u64,
    timestamp: Option<String>,
}

impl TransactionBuilder {
    pub fn new(blockchain: &str, from: &str, to: &str) -> Self {
        Self {
            blockchain: hex_fix(blockchain).to_string(),
            from: hex_fix(from).to_string(),
            to: hex_fix(to).to_string(),
            tx_type: String::new(),
            payload: String::new(),
            nonce: 0,
            timestamp: None,
        }
    }

    pub fn tx_type(mut self, tx_type: impl Into<String>) -> Self {
        self.tx_type = tx_type.into();
        self
    }

    /// Payload that is already hex encoded
    pub fn payload_hex(mut self, payload: &str) -> Self {
        self.payload = hex_fix(payload).to_string();
        self
    }

    /// Serialize `payload` to JSON, then hex encode it
    pub fn payload_json<P: Serialize + ?Sized>(mut self, payload: &P) -> ClientResult<Self> {
        let json = serde_json::to_string(payload)?;
        self.payload = string_to_hex(&json);
        Ok(self)
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// Gateway-format timestamp; the current time is used when unset
    pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Unsigned transaction with its ID
    pub fn build(self) -> Transaction {
        let timestamp = self
            .timestamp
            .unwrap_or_else(|| now_timestamp(&SystemClock));
        let id = build_id(
            &self.blockchain,
            &self.from,
            &self.to,
            &self.payload,
            self.nonce,
            &timestamp,
        );

        Transaction {
            id,
            from: self.from,
            to: self.to,
            timestamp,
            tx_type: self.tx_type,
            payload: self.payload,
            nonce: self.nonce,
            signature: String::new(),
            blockchain: self.blockchain,
        }
    }
}
