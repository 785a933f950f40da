//! # Signature Verification Service
//!
//! Application service layer that implements the `CheckpointSignatureApi` trait
//! by delegating to the pure domain functions.

use crate::domain::ecdsa;
use crate::domain::entities::{Address, BatchVerificationResult, VerificationRequest};
use crate::domain::errors::SignatureError;
use crate::ports::inbound::CheckpointSignatureApi;
use bridge_crypto::Hash;

/// Default secp256k1 checkpoint verifier.
#[derive(Clone, Copy, Debug, Default)]
pub struct EcdsaCheckpointVerifier;

impl EcdsaCheckpointVerifier {
    /// Create a new verifier.
    pub fn new() -> Self {
        Self
    }
}

impl CheckpointSignatureApi for EcdsaCheckpointVerifier {
    fn verify(&self, checkpoint: &Hash, signer: &Address, signature: &[u8]) -> bool {
        ecdsa::verify_checkpoint(checkpoint, signer, signature)
    }

    fn recover_signer(
        &self,
        checkpoint: &Hash,
        signature: &[u8],
    ) -> Result<Address, SignatureError> {
        ecdsa::recover_checkpoint_signer(checkpoint, signature)
    }

    fn batch_verify(&self, requests: &[VerificationRequest]) -> BatchVerificationResult {
        ecdsa::batch_verify_checkpoints(requests)
    }
}
