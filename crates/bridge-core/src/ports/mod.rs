//! # Ports
//!
//! Hexagonal boundaries of the bridge core.

pub mod inbound;
pub mod outbound;

pub use inbound::{BridgeApi, BridgeQueryApi};
pub use outbound::{
    BatchOperation, CheckpointSigner, CheckpointVerifier, DepositLedger, InMemoryKVStore,
    KVStoreError, KeyValueStore,
};
