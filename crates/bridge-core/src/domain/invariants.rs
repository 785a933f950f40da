//! # Domain Invariants
//!
//! Checks over persisted state. A store that fails one of these was not
//! written by this core and is reported as corrupt.

use super::artifact::OutgoingArtifact;
use super::attestation::EventAttestor;
use super::checkpoint::CheckpointParams;
use super::errors::{BridgeError, BridgeResult};
use crate::ports::outbound::KVStoreError;

fn corrupt(message: String) -> BridgeError {
    BridgeError::Storage(KVStoreError::Corruption(message))
}

/// Invariant: an artifact's stored checkpoint is the digest of its payload.
pub fn invariant_checkpoint_matches(
    artifact: &OutgoingArtifact,
    params: &CheckpointParams,
) -> BridgeResult<()> {
    if artifact.compute_checkpoint(params) != artifact.checkpoint() {
        return Err(corrupt(format!("checkpoint of {} does not match payload", artifact.id())));
    }
    Ok(())
}

/// Invariant: a batch only moves its own token contract.
pub fn invariant_single_token(artifact: &OutgoingArtifact) -> BridgeResult<()> {
    if let OutgoingArtifact::Batch(batch) = artifact {
        if batch
            .transactions
            .iter()
            .any(|t| t.token_contract != batch.token_contract)
        {
            return Err(corrupt(format!("{} mixes token contracts", artifact.id())));
        }
    }
    Ok(())
}

/// Invariant: at most one attestation per nonce is observed, and none above
/// the low-water mark.
pub fn invariant_observed_prefix(attestor: &EventAttestor, low_water: u64) -> BridgeResult<()> {
    let mut last_observed: Option<u64> = None;
    for att in attestor.iter().filter(|a| a.observed) {
        let nonce = att.event.nonce;
        if nonce > low_water {
            return Err(corrupt(format!("event {} observed above low water {}", nonce, low_water)));
        }
        if last_observed == Some(nonce) {
            return Err(corrupt(format!("two observed attestations at nonce {}", nonce)));
        }
        last_observed = Some(nonce);
    }
    Ok(())
}
