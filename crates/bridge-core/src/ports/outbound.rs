//! # Outbound Ports
//!
//! Traits for the collaborators the core drives: signature recovery, the
//! key/value store, the chain's token ledger and (orchestrator side) a
//! checkpoint signer.

use crate::domain::errors::BridgeResult;
use crate::domain::value_objects::{ChainAccount, EthAddress};
use bridge_crypto::Hash;
use primitive_types::U256;
use std::collections::BTreeMap;
use thiserror::Error;

/// Checkpoint signature verification - outbound port.
///
/// Must be pure: malformed input answers `false`.
pub trait CheckpointVerifier: Send + Sync {
    /// True iff `signature` over `checkpoint` recovers to `signer`.
    fn verify(&self, checkpoint: &Hash, signer: &EthAddress, signature: &[u8]) -> bool;

    /// Verify many `(checkpoint, signer, signature)` triples. Results keep input order.
    fn verify_all(&self, items: &[(Hash, EthAddress, Vec<u8>)]) -> Vec<bool> {
        items
            .iter()
            .map(|(checkpoint, signer, signature)| self.verify(checkpoint, signer, signature))
            .collect()
    }
}

/// Produces checkpoint signatures for one foreign address - outbound port.
pub trait CheckpointSigner {
    /// Address the signatures recover to.
    fn signer_address(&self) -> EthAddress;

    /// 65-byte `r || s || v` signature over `checkpoint`.
    fn sign_checkpoint(&self, checkpoint: &Hash) -> BridgeResult<Vec<u8>>;
}

/// Chain-native token balances - outbound port.
pub trait DepositLedger {
    /// Credit an attested deposit to its receiver.
    fn credit(&mut self, receiver: &ChainAccount, token: &EthAddress, amount: U256) -> BridgeResult<()>;

    /// Escrow a transfer's amount and fee from its sender.
    fn debit(&mut self, sender: &ChainAccount, token: &EthAddress, amount: U256) -> BridgeResult<()>;

    /// Return a cancelled transfer's amount and fee to its sender.
    fn refund(&mut self, sender: &ChainAccount, token: &EthAddress, amount: U256) -> BridgeResult<()>;
}

/// Storage collaborator failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {0}")]
    Io(String),
    /// Data corruption in the store.
    #[error("KV store corruption: {0}")]
    Corruption(String),
}

/// Abstract interface for key-value database operations.
///
/// The storage engine itself is external; `InMemoryKVStore` backs tests and
/// single-process deployments.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Execute an atomic batch write.
    ///
    /// Either ALL operations in the batch succeed, or NONE are applied.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError>;

    /// All pairs whose key starts with `prefix`, key ascending.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError>;
}

/// Batch operation for atomic writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put {
        /// Key
        key: Vec<u8>,
        /// Value
        value: Vec<u8>,
    },
    /// Delete a key.
    Delete {
        /// Key
        key: Vec<u8>,
    },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }
}

/// In-memory key-value store, ordered so prefix scans come back sorted.
#[derive(Clone, Debug, Default)]
pub struct InMemoryKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryKVStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        // Single owner, no partial failure possible
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    self.data.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    self.data.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
        Ok(self
            .data
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
