//! # Domain Errors
//!
//! Error types for the bridge core. Every rejection is non-fatal: the
//! offending submission has no effect. Only `Storage` signals a failure of an
//! external collaborator that the caller must treat as unrecoverable.

use super::evidence::EquivocationEvidence;
use super::value_objects::{ArtifactId, ArtifactState, EthAddress, ValidatorId};
use crate::ports::outbound::KVStoreError;
use primitive_types::U256;
use thiserror::Error;

/// Bridge core error types.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Nonce gap or replay below the low-water mark. Resubmit later.
    #[error("Out of order nonce: expected {expected}, got {got}")]
    OutOfOrder {
        /// Next nonce the caller may submit
        expected: u64,
        /// Nonce actually submitted
        got: u64,
    },

    /// Conflicting claim or signature from one validator. Evidence is attached.
    #[error("Equivocation by validator {}", .0.validator)]
    Equivocation(Box<EquivocationEvidence>),

    /// Signature malformed, not recovering to the signer, or signer not bound.
    #[error("Invalid signature from validator {validator}: {reason}")]
    InvalidSignature {
        /// Submitting validator
        validator: ValidatorId,
        /// Why the record was rejected
        reason: &'static str,
    },

    /// Submitter is not in the active validator set.
    #[error("Unknown validator: {0}")]
    UnknownValidator(ValidatorId),

    /// Artifact already executed, superseded or timed out.
    #[error("Stale artifact {artifact}: {state:?}")]
    StaleArtifact {
        /// Artifact the submission targeted
        artifact: ArtifactId,
        /// Its terminal state
        state: ArtifactState,
    },

    /// No artifact with this id was ever built.
    #[error("Unknown artifact: {0}")]
    UnknownArtifact(ArtifactId),

    /// Structurally malformed foreign event.
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// Malformed outgoing transfer request.
    #[error("Invalid transfer: {0}")]
    InvalidTransfer(String),

    /// Malformed validator set (empty, duplicates, zero power).
    #[error("Invalid validator set: {0}")]
    InvalidValidatorSet(String),

    /// Nothing to batch for this token.
    #[error("No pending transfers for token {0}")]
    NoPendingTransfers(EthAddress),

    /// Candidate batch does not pay more than the best pending batch.
    #[error("Batch not profitable for token {token}: fee {fee} must exceed {floor}")]
    BatchNotProfitable {
        /// Token contract of the candidate batch
        token: EthAddress,
        /// Total fee of the candidate batch
        fee: U256,
        /// Total fee of the best pending batch
        floor: U256,
    },

    /// Transfer id is not in the pending pool.
    #[error("Transfer not found: {0}")]
    TransferNotFound(u64),

    /// Caller does not own the transfer.
    #[error("Transfer {id} not owned by caller")]
    TransferNotOwned {
        /// Transfer id
        id: u64,
    },

    /// Configuration rejected by `BridgeConfig::validate`.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Signing collaborator failed.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Deposit ledger collaborator failed.
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Storage collaborator failed. Fatal.
    #[error("Storage error: {0}")]
    Storage(#[from] KVStoreError),

    /// Persisted value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
