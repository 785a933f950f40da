//! # Checkpoint Codec
//!
//! Byte-exact preimage of every outgoing artifact, as the foreign contract
//! rebuilds it with `abi.encode`: a sequence of 32-byte big-endian words,
//! hashed with Keccak-256.
//!
//! ## Version 1 layouts
//!
//! ```text
//! batch                               valset update
//! ------------------------------      ------------------------------
//! bridge_id                           bridge_id
//! "transactionBatch" (right-padded)   "checkpoint" (right-padded)
//! version                             version
//! token contract (left-padded)        valset nonce
//! batch nonce                         member count n
//! timeout height                      n x (address, power)
//! transfer count n
//! n x (destination, amount, fee)
//! ```

use super::batch::OutgoingTransfer;
use super::events::{u256_word, u64_word};
use super::value_objects::{ArtifactKind, EthAddress, ValsetMember};
use crate::config::BridgeConfig;
use bridge_crypto::{keccak256, Hash};

/// Domain separator of batch checkpoints.
pub const BATCH_DOMAIN_SEPARATOR: &[u8] = b"transactionBatch";

/// Domain separator of valset checkpoints.
pub const VALSET_DOMAIN_SEPARATOR: &[u8] = b"checkpoint";

const WORD: usize = 32;

/// Deployment-wide inputs shared by every checkpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CheckpointParams {
    /// Bridge deployment identifier
    pub bridge_id: [u8; 32],
    /// Encoding version tag
    pub version: u8,
}

impl CheckpointParams {
    /// Take the codec inputs out of a validated config.
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            bridge_id: config.bridge_id,
            version: config.checkpoint_version,
        }
    }
}

/// Fully materialized payload of an artifact.
#[derive(Clone, Copy, Debug)]
pub enum CheckpointPayload<'a> {
    /// Outgoing transfer batch.
    Batch {
        /// Token contract all transfers move
        token_contract: EthAddress,
        /// Foreign height after which the contract refuses the batch
        timeout_height: u64,
        /// Transfers in batch order
        transfers: &'a [OutgoingTransfer],
    },
    /// Validator set update, members in canonical order.
    ValsetUpdate {
        /// New signing set
        members: &'a [ValsetMember],
    },
}

impl CheckpointPayload<'_> {
    /// Artifact kind this payload belongs to.
    pub fn kind(&self) -> ArtifactKind {
        match self {
            CheckpointPayload::Batch { .. } => ArtifactKind::Batch,
            CheckpointPayload::ValsetUpdate { .. } => ArtifactKind::ValsetUpdate,
        }
    }
}

/// Build the exact preimage the foreign contract hashes.
pub fn encode_checkpoint(params: &CheckpointParams, nonce: u64, payload: &CheckpointPayload<'_>) -> Vec<u8> {
    match payload {
        CheckpointPayload::Batch {
            token_contract,
            timeout_height,
            transfers,
        } => {
            let mut out = Vec::with_capacity(WORD * (7 + 3 * transfers.len()));
            out.extend_from_slice(&params.bridge_id);
            out.extend_from_slice(&separator_word(BATCH_DOMAIN_SEPARATOR));
            out.extend_from_slice(&u64_word(params.version as u64));
            out.extend_from_slice(&token_contract.to_word());
            out.extend_from_slice(&u64_word(nonce));
            out.extend_from_slice(&u64_word(*timeout_height));
            out.extend_from_slice(&u64_word(transfers.len() as u64));
            for transfer in transfers.iter() {
                out.extend_from_slice(&transfer.destination.to_word());
                out.extend_from_slice(&u256_word(&transfer.amount));
                out.extend_from_slice(&u256_word(&transfer.fee));
            }
            out
        }
        CheckpointPayload::ValsetUpdate { members } => {
            let mut out = Vec::with_capacity(WORD * (5 + 2 * members.len()));
            out.extend_from_slice(&params.bridge_id);
            out.extend_from_slice(&separator_word(VALSET_DOMAIN_SEPARATOR));
            out.extend_from_slice(&u64_word(params.version as u64));
            out.extend_from_slice(&u64_word(nonce));
            out.extend_from_slice(&u64_word(members.len() as u64));
            for member in members.iter() {
                out.extend_from_slice(&member.foreign_address.to_word());
                out.extend_from_slice(&u64_word(member.power));
            }
            out
        }
    }
}

/// Keccak-256 of the checkpoint preimage. Pure.
pub fn compute_checkpoint(params: &CheckpointParams, nonce: u64, payload: &CheckpointPayload<'_>) -> Hash {
    keccak256(&encode_checkpoint(params, nonce, payload))
}

/// Right-pad an ASCII separator to one word.
fn separator_word(separator: &[u8]) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[..separator.len()].copy_from_slice(separator);
    word
}
