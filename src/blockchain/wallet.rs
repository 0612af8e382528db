//! Key material: secret decoding, public key and address derivation.
//!
//! # Security
//! - Secret keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized
//! - Decoded secret bytes are zeroized as soon as the signing key is built,
//!   and the signing key itself is zeroized on drop

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use ed25519_dalek::{Signature, Signer as _, SigningKey, VerifyingKey, SECRET_KEY_LENGTH};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::blockchain::types::{Address, WalletError, WalletResult, ADDRESS_PREFIX};

/// Environment variable name for the base64 secret key.
pub const PRIVATE_KEY_ENV_VAR: &str = "OCTRA_PRIVATE_KEY";

/// Length of a secret given as seed ‖ public key.
const KEYPAIR_LENGTH: usize = 64;

/// Validate a base64 secret: it must decode to exactly 32 or 64 bytes.
pub fn validate_private_key(secret_b64: &str) -> WalletResult<()> {
    decode_secret(secret_b64).map(|_| ())
}

/// Base64 public key derived from a base64 secret.
pub fn derive_public_key(secret_b64: &str) -> WalletResult<String> {
    Ok(KeyMaterial::from_base64(secret_b64)?.public_key_base64())
}

/// Address derived from a base64 secret.
pub fn derive_address(secret_b64: &str) -> WalletResult<Address> {
    Ok(KeyMaterial::from_base64(secret_b64)?.address().clone())
}

/// `oct` + base58(sha256(public key)).
pub fn address_from_public_key(public_key: &VerifyingKey) -> Address {
    let digest = Sha256::digest(public_key.as_bytes());
    Address::from_derived(format!(
        "{}{}",
        ADDRESS_PREFIX,
        bs58::encode(digest).into_string()
    ))
}

fn decode_secret(secret_b64: &str) -> WalletResult<Zeroizing<Vec<u8>>> {
    let decoded = B64
        .decode(secret_b64.trim())
        .map(Zeroizing::new)
        .map_err(|e| WalletError::InvalidKey {
            reason: format!("invalid base64: {}", e),
        })?;

    if decoded.len() != SECRET_KEY_LENGTH && decoded.len() != KEYPAIR_LENGTH {
        tracing::debug!(length = decoded.len(), "Rejected secret key length");
        return Err(WalletError::InvalidKey {
            reason: "bad length".to_string(),
        });
    }

    Ok(decoded)
}

/// Decoded signing key plus the identity derived from it.
///
/// Signing takes `&self` and keeps no mutable state, so one instance can be
/// shared across concurrent signs.
pub struct KeyMaterial {
    signing_key: SigningKey,
    address: Address,
}

impl KeyMaterial {
    /// Decode a base64 secret of 32 bytes (seed) or 64 bytes (seed ‖ public key).
    ///
    /// The public key is always derived from the seed. A 64-byte secret whose
    /// second half disagrees with the derived key is accepted with a warning.
    pub fn from_base64(secret_b64: &str) -> WalletResult<Self> {
        let decoded = decode_secret(secret_b64)?;

        let mut seed = Zeroizing::new([0u8; SECRET_KEY_LENGTH]);
        seed.copy_from_slice(&decoded[..SECRET_KEY_LENGTH]);
        let signing_key = SigningKey::from_bytes(&seed);

        if decoded.len() == KEYPAIR_LENGTH
            && decoded[SECRET_KEY_LENGTH..] != signing_key.verifying_key().to_bytes()
        {
            tracing::warn!("Trailing public key half does not match the seed; using the derived key");
        }

        let address = address_from_public_key(&signing_key.verifying_key());

        tracing::info!(address = %address, "Key material loaded");

        Ok(Self {
            signing_key,
            address,
        })
    }

    /// Load key material from `OCTRA_PRIVATE_KEY`.
    pub fn from_env() -> WalletResult<Self> {
        let secret = Zeroizing::new(std::env::var(PRIVATE_KEY_ENV_VAR).map_err(|_| {
            WalletError::InvalidKey {
                reason: format!("environment variable {} not set", PRIVATE_KEY_ENV_VAR),
            }
        })?);

        Self::from_base64(&secret)
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    pub fn public_key_base64(&self) -> String {
        B64.encode(self.public_key_bytes())
    }

    /// Detached Ed25519 signature over `message`.
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("address", &self.address)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}
