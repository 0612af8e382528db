//! Canonical encoding and Ed25519 signing of transfers.
//!
//! The canonical form is compact JSON with the field order of
//! [`UnsignedTransaction`] and no insignificant whitespace. Those bytes are the
//! signing message; the node re-derives them, so any drift in key order,
//! spacing or number formatting invalidates the signature.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::blockchain::transaction::UnsignedTransaction;
use crate::blockchain::types::{WalletError, WalletResult};
use crate::blockchain::wallet::KeyMaterial;

/// Unsigned transaction plus detached signature and public key (both base64).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
    #[serde(flatten)]
    pub tx: UnsignedTransaction,
    pub signature: String,
    pub public_key: String,
}

impl SignedTransaction {
    /// Check the attached signature against the attached public key.
    pub fn verify(&self) -> WalletResult<()> {
        verify_canonical(&self.public_key, &self.signature, &canonicalize(&self.tx)?)
    }
}

/// Bytes that get signed.
pub fn canonicalize(tx: &UnsignedTransaction) -> WalletResult<Vec<u8>> {
    serde_json::to_vec(tx).map_err(|e| WalletError::Encoding(e.to_string()))
}

/// Sign `tx` with already-loaded key material.
pub fn sign(keys: &KeyMaterial, tx: UnsignedTransaction) -> WalletResult<SignedTransaction> {
    let message = canonicalize(&tx)?;
    let signature = keys.sign(&message);

    tracing::debug!(
        from = %tx.from,
        nonce = tx.nonce,
        message_len = message.len(),
        "Signed transaction"
    );

    Ok(SignedTransaction {
        tx,
        signature: B64.encode(signature.to_bytes()),
        public_key: keys.public_key_base64(),
    })
}

/// Sign `tx` with a base64 secret, validating it first.
pub fn sign_with_secret(secret_b64: &str, tx: UnsignedTransaction) -> WalletResult<SignedTransaction> {
    let keys = KeyMaterial::from_base64(secret_b64)?;
    sign(&keys, tx)
}

/// Verify a base64 signature over `message` with a base64 public key.
pub fn verify_canonical(public_key_b64: &str, signature_b64: &str, message: &[u8]) -> WalletResult<()> {
    let public_key: [u8; 32] = B64
        .decode(public_key_b64)
        .map_err(|e| WalletError::Signature(format!("public key is not base64: {}", e)))?
        .try_into()
        .map_err(|_| WalletError::Signature("public key must be 32 bytes".to_string()))?;
    let signature: [u8; 64] = B64
        .decode(signature_b64)
        .map_err(|e| WalletError::Signature(format!("signature is not base64: {}", e)))?
        .try_into()
        .map_err(|_| WalletError::Signature("signature must be 64 bytes".to_string()))?;

    let verifying_key = VerifyingKey::from_bytes(&public_key)
        .map_err(|e| WalletError::Signature(format!("invalid public key: {}", e)))?;

    verifying_key
        .verify(message, &Signature::from_bytes(&signature))
        .map_err(|_| WalletError::Signature("signature does not verify".to_string()))
}
