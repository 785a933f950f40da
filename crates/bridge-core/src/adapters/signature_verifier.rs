//! Signature Verification Adapter
//!
//! Implements the `CheckpointVerifier` port with secp256k1 public-key
//! recovery from `bridge-sigverify`.

use crate::domain::value_objects::EthAddress;
use crate::ports::outbound::CheckpointVerifier;
use bridge_crypto::Hash;
use bridge_sigverify::{CheckpointSignatureApi, EcdsaCheckpointVerifier, VerificationRequest};
use tracing::debug;

/// ECDSA checkpoint verifier.
#[derive(Clone, Copy, Debug, Default)]
pub struct EcdsaSignatureVerifier {
    inner: EcdsaCheckpointVerifier,
}

impl EcdsaSignatureVerifier {
    /// Create a new verifier.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointVerifier for EcdsaSignatureVerifier {
    fn verify(&self, checkpoint: &Hash, signer: &EthAddress, signature: &[u8]) -> bool {
        self.inner.verify(checkpoint, signer.as_bytes(), signature)
    }

    fn verify_all(&self, items: &[(Hash, EthAddress, Vec<u8>)]) -> Vec<bool> {
        let requests: Vec<VerificationRequest> = items
            .iter()
            .map(|(checkpoint, signer, signature)| VerificationRequest {
                checkpoint: *checkpoint,
                signature: signature.clone(),
                expected_signer: signer.0,
            })
            .collect();

        let result = self.inner.batch_verify(&requests);
        debug!(
            "[bridge] re-verified {} signatures, {} invalid",
            requests.len(),
            result.invalid_count
        );
        result.results.into_iter().map(|r| r.valid).collect()
    }
}
