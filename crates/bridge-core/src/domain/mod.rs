//! # Domain Module
//!
//! Core domain types and rules of the bridge: event attestation, checkpoint
//! encoding, batching, signature collection and the validator set.

pub mod artifact;
pub mod attestation;
pub mod batch;
pub mod checkpoint;
pub mod errors;
pub mod events;
pub mod evidence;
pub mod invariants;
pub mod nonce;
pub mod signature_store;
pub mod store_keys;
pub mod validator_set;
pub mod value_objects;

pub use artifact::OutgoingArtifact;
pub use attestation::{Attestation, AttestationStatus, ClaimOutcome, EventAttestor};
pub use batch::{OutgoingBatch, OutgoingBatchBuilder, OutgoingTransfer, TransferPool};
pub use checkpoint::{compute_checkpoint, encode_checkpoint, CheckpointParams, CheckpointPayload};
pub use errors::{BridgeError, BridgeResult};
pub use events::{Erc20Registration, EventKind, ForeignEvent};
pub use evidence::{Conflict, EquivocationEvidence};
pub use invariants::*;
pub use nonce::{NonceSequencer, Stream};
pub use signature_store::{order_signatures, SignatureOutcome, SignatureRecord, SignatureStore};
pub use validator_set::{ValidatorSetEntry, ValidatorSetView, ValsetUpdate};
pub use value_objects::*;
