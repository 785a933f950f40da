//! # Inbound Ports (Driving Ports / API)
//!
//! Traits that define the public API of this subsystem.

use crate::domain::entities::{Address, BatchVerificationResult, VerificationRequest};
use crate::domain::errors::SignatureError;
use bridge_crypto::Hash;

/// Checkpoint signature verification API.
///
/// Implementations must be thread-safe (`Send + Sync`) and stateless: the
/// same inputs always produce the same answer.
pub trait CheckpointSignatureApi: Send + Sync {
    /// Check that `signature` over `checkpoint` recovers to `signer`.
    ///
    /// # Security
    /// - Rejects signatures with high S values (EIP-2 malleability protection)
    /// - Malformed input yields `false`
    fn verify(&self, checkpoint: &Hash, signer: &Address, signature: &[u8]) -> bool;

    /// Recover the address that signed `checkpoint`.
    fn recover_signer(&self, checkpoint: &Hash, signature: &[u8])
        -> Result<Address, SignatureError>;

    /// Verify many signatures at once. Results keep request order.
    fn batch_verify(&self, requests: &[VerificationRequest]) -> BatchVerificationResult;
}
