//! Outgoing events
//!
//! Emitted at every state transition the surrounding chain or relayers care
//! about. Drained once per step through `BridgeService::drain_events`.

use crate::domain::evidence::EquivocationEvidence;
use crate::domain::value_objects::{ArtifactId, ChainAccount, EthAddress};
use bridge_crypto::Hash;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Bridge state transition notifications.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeEvent {
    /// A foreign event crossed the threshold and was applied.
    EventFinalized {
        /// Event nonce
        nonce: u64,
        /// Event hash
        event_hash: Hash,
    },
    /// A finalized event whose effect could not be applied.
    EventSkipped {
        /// Event nonce
        nonce: u64,
        /// Why nothing was applied
        reason: String,
    },
    /// An attested deposit was credited.
    DepositCredited {
        /// Event nonce
        nonce: u64,
        /// Receiver
        receiver: ChainAccount,
        /// Token contract
        token_contract: EthAddress,
        /// Amount
        amount: U256,
    },
    /// An outgoing transfer entered the pool.
    TransferQueued {
        /// Transfer id
        id: u64,
        /// Token contract
        token_contract: EthAddress,
    },
    /// A pending transfer was cancelled and refunded.
    TransferCancelled {
        /// Transfer id
        id: u64,
    },
    /// A new artifact opened for signing.
    ArtifactCreated {
        /// Artifact id
        artifact: ArtifactId,
        /// Checkpoint to sign
        checkpoint: Hash,
    },
    /// Threshold power signed; relayers may submit it.
    ArtifactExecutable {
        /// Artifact id
        artifact: ArtifactId,
    },
    /// The foreign contract executed the artifact.
    ArtifactExecuted {
        /// Artifact id
        artifact: ArtifactId,
    },
    /// A later artifact executed first.
    ArtifactSuperseded {
        /// Artifact id
        artifact: ArtifactId,
        /// Transfers returned to the pool
        released: usize,
    },
    /// The foreign chain passed the batch timeout.
    BatchTimedOut {
        /// Batch nonce
        batch_nonce: u64,
        /// Transfers returned to the pool
        released: usize,
    },
    /// A new validator set became active.
    ValsetActivated {
        /// Valset nonce
        valset_nonce: u64,
    },
    /// Foreign token metadata registered.
    Erc20Registered {
        /// Token contract
        token_contract: EthAddress,
        /// Chain-native denom
        denom: String,
    },
    /// Conflicting submissions detected.
    EquivocationDetected(EquivocationEvidence),
}
