//! # Keccak-256 Hashing
//!
//! The foreign contract recomputes every digest produced here, so the
//! algorithm is fixed to Ethereum's Keccak-256 (not NIST SHA3-256).

use sha3::{Digest, Keccak256};

/// Keccak-256 output (256-bit).
pub type Hash = [u8; 32];

/// Prefix applied by `personal_sign` / EIP-191 to a 32-byte message.
const ETH_SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Stateful Keccak-256 hasher.
#[derive(Clone, Default)]
pub struct Keccak256Hasher {
    inner: Keccak256,
}

impl Keccak256Hasher {
    /// Create new hasher.
    pub fn new() -> Self {
        Self {
            inner: Keccak256::new(),
        }
    }

    /// Update with data.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Finalize and return hash.
    pub fn finalize(self) -> Hash {
        self.inner.finalize().into()
    }
}

/// Hash data with Keccak-256 (one-shot).
pub fn keccak256(data: &[u8]) -> Hash {
    Keccak256::digest(data).into()
}

/// Hash the concatenation of multiple inputs.
pub fn keccak256_many(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Keccak256Hasher::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize()
}

/// Digest a validator actually signs for a checkpoint.
///
/// `keccak256("\x19Ethereum Signed Message:\n32" || checkpoint)`, which is what
/// `ecrecover` on the foreign contract is fed after it applies the same prefix.
pub fn eth_signed_message_hash(checkpoint: &Hash) -> Hash {
    keccak256_many(&[ETH_SIGNED_MESSAGE_PREFIX, checkpoint])
}
