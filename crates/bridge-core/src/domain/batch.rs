//! # Outgoing Batch Builder
//!
//! Turns pending transfer requests into an immutable, checkpointed batch.
//! Selection is a pure function of the pool, so every validator builds the
//! byte-identical batch from identical state.

use super::checkpoint::{compute_checkpoint, CheckpointParams, CheckpointPayload};
use super::errors::{BridgeError, BridgeResult};
use super::nonce::{NonceSequencer, Stream};
use super::value_objects::{ArtifactId, ArtifactState, ChainAccount, EthAddress};
use bridge_crypto::Hash;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A chain-native request to send tokens to the foreign chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingTransfer {
    /// Submission-order id
    pub id: u64,
    /// Chain-native sender
    pub sender: ChainAccount,
    /// Foreign receiver
    pub destination: EthAddress,
    /// Foreign token contract
    pub token_contract: EthAddress,
    /// Amount delivered to `destination`
    pub amount: U256,
    /// Fee paid to whoever relays the batch
    pub fee: U256,
}

/// Transfers waiting to be batched, keyed by id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransferPool {
    pending: BTreeMap<u64, OutgoingTransfer>,
}

impl TransferPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or return) a transfer.
    pub fn insert(&mut self, transfer: OutgoingTransfer) {
        self.pending.insert(transfer.id, transfer);
    }

    /// Remove a transfer by id.
    pub fn remove(&mut self, id: u64) -> Option<OutgoingTransfer> {
        self.pending.remove(&id)
    }

    /// Look up a transfer by id.
    pub fn get(&self, id: u64) -> Option<&OutgoingTransfer> {
        self.pending.get(&id)
    }

    /// Pending transfers for one token, in id order.
    pub fn for_token(&self, token: &EthAddress) -> impl Iterator<Item = &OutgoingTransfer> + '_ {
        let token = *token;
        self.pending
            .values()
            .filter(move |t| t.token_contract == token)
    }

    /// Up to `max` transfers for `token`: fee descending, id ascending.
    pub fn select(&self, token: &EthAddress, max: usize) -> Vec<OutgoingTransfer> {
        let mut candidates: Vec<&OutgoingTransfer> = self.for_token(token).collect();
        candidates.sort_by(|a, b| b.fee.cmp(&a.fee).then_with(|| a.id.cmp(&b.id)));
        candidates.into_iter().take(max).cloned().collect()
    }

    /// All pending transfers, in id order.
    pub fn iter(&self) -> impl Iterator<Item = &OutgoingTransfer> + '_ {
        self.pending.values()
    }

    /// Number of pending transfers.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// A checkpointed bundle of transfers for one token contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingBatch {
    /// Batch nonce, shared across tokens
    pub batch_nonce: u64,
    /// Token contract every transfer moves
    pub token_contract: EthAddress,
    /// Transfers in batch order
    pub transactions: Vec<OutgoingTransfer>,
    /// Foreign height after which the contract refuses this batch
    pub timeout_height: u64,
    /// Digest validators sign
    pub checkpoint: Hash,
    /// Lifecycle state
    pub state: ArtifactState,
}

impl OutgoingBatch {
    /// Artifact identity.
    pub fn artifact_id(&self) -> ArtifactId {
        ArtifactId::batch(self.batch_nonce)
    }

    /// Sum of all transfer fees.
    pub fn total_fee(&self) -> U256 {
        total_fee(&self.transactions)
    }

    /// Recompute the checkpoint from the stored payload.
    pub fn compute_checkpoint(&self, params: &CheckpointParams) -> Hash {
        compute_checkpoint(
            params,
            self.batch_nonce,
            &CheckpointPayload::Batch {
                token_contract: self.token_contract,
                timeout_height: self.timeout_height,
                transfers: &self.transactions,
            },
        )
    }

    /// Whether the contract can still execute this batch.
    pub fn is_live(&self) -> bool {
        !self.state.is_terminal()
    }
}

fn total_fee(transfers: &[OutgoingTransfer]) -> U256 {
    transfers
        .iter()
        .fold(U256::zero(), |acc, t| acc.saturating_add(t.fee))
}

/// Inputs to one batch build that come from chain state, not the pool.
#[derive(Clone, Copy, Debug)]
pub struct OutgoingBatchBuilder<'a> {
    /// Codec parameters
    pub params: &'a CheckpointParams,
    /// Last foreign height seen in a finalized event
    pub last_observed_height: u64,
    /// Blocks added to `last_observed_height` for the timeout
    pub timeout_blocks: u64,
    /// Total fee the new batch must exceed, if the improvement rule applies
    pub fee_floor: Option<U256>,
}

impl OutgoingBatchBuilder<'_> {
    /// Build the next batch for `token_contract`.
    ///
    /// On success the selected transfers leave the pool and the batch nonce is
    /// consumed. On error neither the pool nor the sequencer changes.
    pub fn build_batch(
        &self,
        pool: &mut TransferPool,
        token_contract: EthAddress,
        max_size: usize,
        nonces: &mut NonceSequencer,
    ) -> BridgeResult<OutgoingBatch> {
        let transactions = pool.select(&token_contract, max_size);
        if transactions.is_empty() {
            return Err(BridgeError::NoPendingTransfers(token_contract));
        }

        let fee = total_fee(&transactions);
        if let Some(floor) = self.fee_floor {
            if fee <= floor {
                return Err(BridgeError::BatchNotProfitable {
                    token: token_contract,
                    fee,
                    floor,
                });
            }
        }

        let batch_nonce = nonces.assign_next(Stream::OutgoingBatches);
        for transfer in &transactions {
            pool.remove(transfer.id);
        }

        let mut batch = OutgoingBatch {
            batch_nonce,
            token_contract,
            transactions,
            timeout_height: self.last_observed_height.saturating_add(self.timeout_blocks),
            checkpoint: [0u8; 32],
            state: ArtifactState::PendingSignatures,
        };
        batch.checkpoint = batch.compute_checkpoint(self.params);
        Ok(batch)
    }
}
