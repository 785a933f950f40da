//! # Outgoing Artifacts
//!
//! Closed set of things validators sign for the foreign contract. Every
//! variant carries its fully materialized payload, so its checkpoint can be
//! recomputed from the artifact alone.

use super::batch::OutgoingBatch;
use super::checkpoint::{compute_checkpoint, CheckpointParams, CheckpointPayload};
use super::validator_set::ValsetUpdate;
use super::value_objects::{ArtifactId, ArtifactState};
use bridge_crypto::Hash;
use serde::{Deserialize, Serialize};

/// A signable outgoing artifact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutgoingArtifact {
    /// Transfer batch.
    Batch(OutgoingBatch),
    /// Validator set update.
    ValsetUpdate(ValsetUpdate),
}

impl OutgoingArtifact {
    /// Artifact identity.
    pub fn id(&self) -> ArtifactId {
        match self {
            OutgoingArtifact::Batch(batch) => batch.artifact_id(),
            OutgoingArtifact::ValsetUpdate(update) => update.artifact_id(),
        }
    }

    /// Stored checkpoint.
    pub fn checkpoint(&self) -> Hash {
        match self {
            OutgoingArtifact::Batch(batch) => batch.checkpoint,
            OutgoingArtifact::ValsetUpdate(update) => update.checkpoint,
        }
    }

    /// Checkpoint recomputed from the payload.
    pub fn compute_checkpoint(&self, params: &CheckpointParams) -> Hash {
        match self {
            OutgoingArtifact::Batch(batch) => batch.compute_checkpoint(params),
            OutgoingArtifact::ValsetUpdate(update) => {
                let members = update.set.valset_members();
                compute_checkpoint(
                    params,
                    update.valset_nonce(),
                    &CheckpointPayload::ValsetUpdate { members: &members },
                )
            }
        }
    }

    /// Lifecycle state.
    pub fn state(&self) -> ArtifactState {
        match self {
            OutgoingArtifact::Batch(batch) => batch.state,
            OutgoingArtifact::ValsetUpdate(update) => update.state,
        }
    }
}
