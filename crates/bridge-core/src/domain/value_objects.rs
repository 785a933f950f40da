//! # Domain Value Objects
//!
//! Immutable value types shared by every bridge component.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of a chain-native account string.
pub const MAX_ACCOUNT_LEN: usize = 128;

/// 20-byte address on the foreign smart-contract chain.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EthAddress(pub [u8; 20]);

impl EthAddress {
    /// The zero address.
    pub const ZERO: EthAddress = EthAddress([0u8; 20]);

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Left-pad to a 32-byte word, the way the foreign contract encodes `address`.
    pub fn to_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&self.0);
        word
    }
}

impl From<[u8; 20]> for EthAddress {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EthAddress({})", self)
    }
}

impl FromStr for EthAddress {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)?;
        Ok(Self(bytes))
    }
}

/// Chain-native validator operator identity.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValidatorId(pub [u8; 20]);

impl ValidatorId {
    /// Create from raw bytes.
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for ValidatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "val:{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ValidatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValidatorId({})", hex::encode(&self.0[..4]))
    }
}

/// Chain-native account (deposit receiver, transfer sender).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChainAccount(String);

impl ChainAccount {
    /// Create an account, rejecting empty, oversized or whitespace-bearing strings.
    pub fn new(account: impl Into<String>) -> Option<Self> {
        let account = Self(account.into());
        account.is_well_formed().then_some(account)
    }

    /// Structural check, also applied to deserialized values.
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty()
            && self.0.len() <= MAX_ACCOUNT_LEN
            && self.0.chars().all(|c| c.is_ascii_graphic())
    }

    /// String form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChainAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of outgoing, checkpointed artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// Batch of outgoing transfers for one token contract.
    Batch,
    /// Validator set update.
    ValsetUpdate,
}

impl ArtifactKind {
    /// Byte used in persisted keys.
    pub fn as_byte(&self) -> u8 {
        match self {
            ArtifactKind::Batch => 1,
            ArtifactKind::ValsetUpdate => 2,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Batch => f.write_str("batch"),
            ArtifactKind::ValsetUpdate => f.write_str("valset"),
        }
    }
}

/// Identity of an outgoing artifact: its kind plus its stream nonce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactId {
    /// Artifact kind.
    pub kind: ArtifactKind,
    /// Nonce within the kind's stream.
    pub nonce: u64,
}

impl ArtifactId {
    /// Create a new artifact id.
    pub fn new(kind: ArtifactKind, nonce: u64) -> Self {
        Self { kind, nonce }
    }

    /// Batch artifact id.
    pub fn batch(nonce: u64) -> Self {
        Self::new(ArtifactKind::Batch, nonce)
    }

    /// Validator set update artifact id.
    pub fn valset(nonce: u64) -> Self {
        Self::new(ArtifactKind::ValsetUpdate, nonce)
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.nonce)
    }
}

/// Lifecycle of an outgoing artifact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactState {
    /// Built, collecting signatures.
    #[default]
    PendingSignatures,
    /// Threshold power has signed; exposed to relayers.
    Executable,
    /// Execution observed on the foreign chain.
    Executed,
    /// A later artifact executed first; can never execute.
    Superseded,
    /// Foreign chain passed the batch timeout height.
    TimedOut,
}

impl ArtifactState {
    /// Check if transition is valid.
    pub fn can_transition_to(&self, next: ArtifactState) -> bool {
        match (self, next) {
            (Self::PendingSignatures, Self::Executable) => true,
            (Self::PendingSignatures | Self::Executable, Self::Executed) => true,
            (Self::PendingSignatures | Self::Executable, Self::Superseded) => true,
            (Self::PendingSignatures | Self::Executable, Self::TimedOut) => true,
            _ => false,
        }
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Executed | Self::Superseded | Self::TimedOut)
    }
}

/// One `(foreign address, power)` tuple of a validator set as the foreign
/// contract sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValsetMember {
    /// Signing address on the foreign chain.
    pub foreign_address: EthAddress,
    /// Voting power.
    pub power: u64,
}
