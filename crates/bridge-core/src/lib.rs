//! # Bridge Core
//!
//! Attestation and batching core of a validator-operated chain bridged to a
//! foreign smart-contract chain.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Turn foreign-chain events into threshold-attested facts, applied once
//!   and strictly in nonce order
//! - Turn outgoing transfer requests into checkpointed batches that the
//!   foreign contract verifies against accumulated validator signatures
//! - Rotate the signing set through the same checkpoint and threshold flow
//!
//! ## Safety Properties
//!
//! | Property | Enforced by |
//! |----------|-------------|
//! | Exactly-once finalization | `EventAttestor` low-water mark + service guard |
//! | Replay-proof checkpoints | bridge id + domain separator + nonce in every digest |
//! | Signer binding | `SignatureStore` checks the registered foreign address |
//! | Equivocation evidence | conflicting claims/signatures are recorded, never counted |
//!
//! ## Module Structure
//!
//! ```text
//! bridge-core/
//! ├── domain/     # attestation, checkpoint codec, batches, signatures, valsets
//! ├── ports/      # BridgeApi, BridgeQueryApi, verifier/ledger/store ports
//! ├── adapters/   # ECDSA verifier, local signer, in-memory ledger
//! ├── events/     # BridgeEvent notifications
//! ├── service.rs  # BridgeService state machine
//! └── query.rs    # read-only queries over committed state
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod events;
pub mod ports;
pub mod query;
pub mod service;

// Re-exports
pub use adapters::{EcdsaSignatureVerifier, InMemoryDepositLedger, LocalCheckpointSigner};
pub use config::{BridgeConfig, ThresholdPolicy};
pub use domain::{
    compute_checkpoint, ArtifactId, ArtifactKind, ArtifactState, AttestationStatus, BridgeError,
    BridgeResult, ChainAccount, CheckpointParams, CheckpointPayload, Erc20Registration,
    EquivocationEvidence, EthAddress, EventKind, ForeignEvent, OutgoingArtifact, OutgoingBatch,
    OutgoingTransfer, SignatureOutcome, SignatureRecord, ValidatorId, ValidatorSetEntry,
    ValidatorSetView, ValsetMember, ValsetUpdate,
};
pub use events::BridgeEvent;
pub use ports::{
    BatchOperation, BridgeApi, BridgeQueryApi, CheckpointSigner, CheckpointVerifier,
    DepositLedger, InMemoryKVStore, KVStoreError, KeyValueStore,
};
pub use query::{committed_state, BridgeQuery, CommittedState};
pub use service::BridgeService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
