//! # Foreign Events
//!
//! Claims about something that happened on the foreign chain. Every honest
//! validator that saw the same log derives the same `event_hash`, so votes
//! can be grouped by hash.

use super::errors::{BridgeError, BridgeResult};
use super::value_objects::{ChainAccount, EthAddress, ValsetMember};
use bridge_crypto::{keccak256, Hash, Keccak256Hasher};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Largest `decimals` an ERC20 can report and still fit a U256 unit.
pub const MAX_ERC20_DECIMALS: u8 = 77;

/// Kind-specific payload of a foreign event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Tokens locked in the foreign contract for a chain-native receiver.
    Deposit {
        /// Foreign token contract
        token_contract: EthAddress,
        /// Foreign depositor
        sender: EthAddress,
        /// Chain-native receiver
        receiver: ChainAccount,
        /// Amount in the token's base unit
        amount: U256,
    },
    /// The foreign contract executed an outgoing batch.
    BatchExecuted {
        /// Token contract of the batch
        token_contract: EthAddress,
        /// Executed batch nonce
        batch_nonce: u64,
    },
    /// The foreign contract accepted a validator set update.
    ValsetUpdated {
        /// Accepted valset nonce
        valset_nonce: u64,
        /// Members as recorded by the contract
        members: Vec<ValsetMember>,
    },
    /// A representation of a chain-native asset was deployed on the foreign chain.
    Erc20Deployed {
        /// Newly deployed token contract
        token_contract: EthAddress,
        /// Chain-native denomination it represents
        denom: String,
        /// ERC20 name
        name: String,
        /// ERC20 symbol
        symbol: String,
        /// ERC20 decimals
        decimals: u8,
    },
}

impl EventKind {
    /// Tag word used in the event encoding.
    pub fn tag(&self) -> u8 {
        match self {
            EventKind::Deposit { .. } => 1,
            EventKind::BatchExecuted { .. } => 2,
            EventKind::ValsetUpdated { .. } => 3,
            EventKind::Erc20Deployed { .. } => 4,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Deposit { .. } => "deposit",
            EventKind::BatchExecuted { .. } => "batch-executed",
            EventKind::ValsetUpdated { .. } => "valset-updated",
            EventKind::Erc20Deployed { .. } => "erc20-deployed",
        }
    }
}

/// A validator's claim about one foreign-chain event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignEvent {
    /// Event nonce assigned by the foreign contract
    pub nonce: u64,
    /// Foreign block height the event was observed at
    pub observed_height: u64,
    /// Kind and payload
    pub kind: EventKind,
}

impl ForeignEvent {
    /// Create a new event claim.
    pub fn new(nonce: u64, observed_height: u64, kind: EventKind) -> Self {
        Self {
            nonce,
            observed_height,
            kind,
        }
    }

    /// Deterministic digest over nonce, kind tag, payload and observed height.
    pub fn event_hash(&self) -> Hash {
        let mut hasher = Keccak256Hasher::new();
        hasher.update(&u64_word(self.nonce));
        hasher.update(&u64_word(self.kind.tag() as u64));

        match &self.kind {
            EventKind::Deposit {
                token_contract,
                sender,
                receiver,
                amount,
            } => {
                hasher.update(&token_contract.to_word());
                hasher.update(&sender.to_word());
                hasher.update(&keccak256(receiver.as_str().as_bytes()));
                hasher.update(&u256_word(amount));
            }
            EventKind::BatchExecuted {
                token_contract,
                batch_nonce,
            } => {
                hasher.update(&token_contract.to_word());
                hasher.update(&u64_word(*batch_nonce));
            }
            EventKind::ValsetUpdated {
                valset_nonce,
                members,
            } => {
                hasher.update(&u64_word(*valset_nonce));
                hasher.update(&u64_word(members.len() as u64));
                for member in members {
                    hasher.update(&member.foreign_address.to_word());
                    hasher.update(&u64_word(member.power));
                }
            }
            EventKind::Erc20Deployed {
                token_contract,
                denom,
                name,
                symbol,
                decimals,
            } => {
                hasher.update(&token_contract.to_word());
                hasher.update(&keccak256(denom.as_bytes()));
                hasher.update(&keccak256(name.as_bytes()));
                hasher.update(&keccak256(symbol.as_bytes()));
                hasher.update(&u64_word(*decimals as u64));
            }
        }

        hasher.update(&u64_word(self.observed_height));
        hasher.finalize()
    }

    /// Ingestion check. Only a nonce the contract could never assign is
    /// refused; payload problems are attested like anything else.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.nonce == 0 {
            return Err(BridgeError::InvalidEvent("event nonce starts at 1".into()));
        }
        Ok(())
    }

    /// Why a finalized event cannot take effect, if it cannot.
    ///
    /// The foreign contract assigns a nonce to anything it emits, so these
    /// events still finalize and advance the stream; their handler is skipped.
    pub fn payload_defect(&self) -> Option<String> {
        match &self.kind {
            EventKind::Deposit {
                receiver, amount, ..
            } => {
                if !receiver.is_well_formed() {
                    return Some(format!("malformed deposit receiver {:?}", receiver.as_str()));
                }
                if amount.is_zero() {
                    return Some("zero deposit amount".into());
                }
            }
            EventKind::BatchExecuted { batch_nonce, .. } => {
                if *batch_nonce == 0 {
                    return Some("batch nonce starts at 1".into());
                }
            }
            EventKind::ValsetUpdated { members, .. } => {
                if members.iter().all(|m| m.power == 0) {
                    return Some("validator set has no power".into());
                }
            }
            EventKind::Erc20Deployed {
                denom, decimals, ..
            } => {
                if denom.is_empty() {
                    return Some("empty erc20 denom".into());
                }
                if *decimals > MAX_ERC20_DECIMALS {
                    return Some(format!("erc20 decimals {} out of range", decimals));
                }
            }
        }
        None
    }
}

/// Foreign token metadata recorded from an attested `Erc20Deployed` event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20Registration {
    /// Foreign token contract
    pub token_contract: EthAddress,
    /// Chain-native denomination
    pub denom: String,
    /// ERC20 name
    pub name: String,
    /// ERC20 symbol
    pub symbol: String,
    /// ERC20 decimals
    pub decimals: u8,
    /// Event nonce that registered it
    pub event_nonce: u64,
}

/// Big-endian 32-byte word of an unsigned integer.
pub(crate) fn u64_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Big-endian 32-byte word of a U256.
pub(crate) fn u256_word(value: &U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}
