//! secp256k1 signing over SHA-256 digests
//!
//! Keys and signatures cross the API as hex strings: private keys are 32-byte
//! scalars, public keys are uncompressed SEC1 points and signatures are DER.

use crate::encoding::hex_fix;
use crate::error::{ClientError, ClientResult};

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};

/// Signing primitives used by the transaction pipeline
#[cfg_attr(test, mockall::automock)]
pub trait CryptoProvider: Send + Sync {
    /// DER signature (hex) of `SHA256(message)`
    fn sign(&self, message: &str, private_key: &str) -> ClientResult<String>;

    /// Check a DER signature (hex) of `SHA256(message)`; malformed input is `false`
    fn verify(&self, public_key: &str, message: &str, signature: &str) -> bool;

    /// Uncompressed public key (hex) for a private key
    fn derive_public_key(&self, private_key: &str) -> ClientResult<String>;
}

/// Deterministic (RFC 6979) ECDSA over secp256k1
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1Provider;

impl Secp256k1Provider {
    pub fn new() -> Self {
        Self
    }

    fn signing_key(private_key: &str) -> ClientResult<SigningKey> {
        let bytes = hex::decode(hex_fix(private_key))
            .map_err(|e| ClientError::Crypto(format!("Invalid private key hex: {}", e)))?;
        SigningKey::from_slice(&bytes)
            .map_err(|e| ClientError::Crypto(format!("Invalid private key: {}", e)))
    }
}

impl CryptoProvider for Secp256k1Provider {
    fn sign(&self, message: &str, private_key: &str) -> ClientResult<String> {
        let key = Self::signing_key(private_key)?;
        let digest = Sha256::digest(message.as_bytes());

        let signature: Signature = key
            .sign_prehash(&digest)
            .map_err(|e| ClientError::Crypto(format!("Signing failed: {}", e)))?;
        let signature = signature.normalize_s().unwrap_or(signature);

        Ok(hex::encode(signature.to_der().as_bytes()))
    }

    fn verify(&self, public_key: &str, message: &str, signature: &str) -> bool {
        let Ok(key_bytes) = hex::decode(hex_fix(public_key)) else {
            return false;
        };
        let Ok(sig_bytes) = hex::decode(hex_fix(signature)) else {
            return false;
        };
        let Ok(key) = VerifyingKey::from_sec1_bytes(&key_bytes) else {
            return false;
        };
        let Ok(signature) = Signature::from_der(&sig_bytes) else {
            return false;
        };

        // Other signers may emit high-S signatures
        let signature = signature.normalize_s().unwrap_or(signature);
        let digest = Sha256::digest(message.as_bytes());

        key.verify_prehash(&digest, &signature).is_ok()
    }

    fn derive_public_key(&self, private_key: &str) -> ClientResult<String> {
        let key = Self::signing_key(private_key)?;
        let point = key.verifying_key().to_encoded_point(false);
        Ok(hex::encode(point.as_bytes()))
    }
}

/// Lowercase hex SHA-256 of the UTF-8 bytes of `input`
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Wallet address for a public key: `SHA256(public key hex)`
pub fn address_from_public_key(public_key: &str) -> String {
    sha256_hex(hex_fix(public_key))
}
