//! # ECDSA Checkpoint Signing (secp256k1)
//!
//! Orchestrator-side signing of checkpoints. The bridge core never holds keys;
//! it only consumes the 65-byte `r || s || v` signatures produced here (or by
//! any external signer that follows the same EIP-191 convention).
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Low-S normalization (EIP-2), recovery id adjusted accordingly
//! - `v` encoded as 27/28, the form `ecrecover` expects

use crate::hashing::{eth_signed_message_hash, keccak256, Hash};
use crate::CryptoError;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use zeroize::Zeroizing;

/// Length of a recoverable signature: r (32) || s (32) || v (1).
pub const RECOVERABLE_SIGNATURE_LEN: usize = 65;

/// Derive the 20-byte foreign-chain address of a public key.
///
/// Last 20 bytes of `keccak256(x || y)` over the uncompressed point.
pub fn address_from_verifying_key(key: &VerifyingKey) -> [u8; 20] {
    let encoded = key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Recoverable ECDSA signature (65 bytes, r||s||v format).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoverableSignature([u8; RECOVERABLE_SIGNATURE_LEN]);

impl RecoverableSignature {
    /// Create from a byte slice; the length must be exactly 65.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; RECOVERABLE_SIGNATURE_LEN] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignatureLength(bytes.len()))?;
        Ok(Self(array))
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; RECOVERABLE_SIGNATURE_LEN] {
        &self.0
    }

    /// Owned copy of the raw bytes.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Recovery byte (27 or 28).
    pub fn v(&self) -> u8 {
        self.0[64]
    }
}

/// secp256k1 keypair used by a validator's orchestrator.
pub struct Secp256k1KeyPair {
    signing_key: SigningKey,
}

impl Secp256k1KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        Self { signing_key }
    }

    /// Create from secret key bytes (32 bytes).
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_bytes((&bytes).into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Foreign-chain address controlled by this key.
    pub fn eth_address(&self) -> [u8; 20] {
        address_from_verifying_key(self.signing_key.verifying_key())
    }

    /// Public verifying key.
    pub fn verifying_key(&self) -> &VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Sign a 32-byte prehash, returning `r || s || v` with low S.
    pub fn sign_prehash(&self, prehash: &Hash) -> Result<RecoverableSignature, CryptoError> {
        let (signature, recovery_id): (Signature, RecoveryId) = self
            .signing_key
            .sign_prehash_recoverable(prehash)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

        let (signature, recovery_id) = match signature.normalize_s() {
            Some(normalized) => (
                normalized,
                RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
            ),
            None => (signature, recovery_id),
        };

        let mut bytes = [0u8; RECOVERABLE_SIGNATURE_LEN];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = recovery_id.to_byte() + 27;
        Ok(RecoverableSignature(bytes))
    }

    /// Sign a checkpoint the way the foreign contract verifies it (EIP-191).
    pub fn sign_checkpoint(&self, checkpoint: &Hash) -> Result<RecoverableSignature, CryptoError> {
        self.sign_prehash(&eth_signed_message_hash(checkpoint))
    }

    /// Secret key bytes, wiped when the returned buffer is dropped.
    pub fn secret_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing_key.to_bytes().into())
    }
}
