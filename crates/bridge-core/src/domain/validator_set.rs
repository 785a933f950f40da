//! # Validator Set View
//!
//! Versioned, immutable snapshot of the signing set. A new snapshot only
//! becomes active after the foreign contract reports it accepted the matching
//! valset update and that report is itself attested.

use super::checkpoint::{compute_checkpoint, CheckpointParams, CheckpointPayload};
use super::errors::{BridgeError, BridgeResult};
use super::value_objects::{ArtifactId, ArtifactState, EthAddress, ValidatorId, ValsetMember};
use crate::config::ThresholdPolicy;
use bridge_crypto::Hash;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One validator's membership in a set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSetEntry {
    /// Chain-native validator identity
    pub validator: ValidatorId,
    /// Address its orchestrator signs checkpoints with
    pub foreign_address: EthAddress,
    /// Voting power
    pub power: u64,
}

impl ValidatorSetEntry {
    /// Create a new entry.
    pub fn new(validator: ValidatorId, foreign_address: EthAddress, power: u64) -> Self {
        Self {
            validator,
            foreign_address,
            power,
        }
    }
}

/// Active validator set snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSetView {
    valset_nonce: u64,
    entries: BTreeMap<ValidatorId, ValidatorSetEntry>,
    /// Validators by power descending, foreign address ascending
    canonical: Vec<ValidatorId>,
    total_power: u64,
}

impl ValidatorSetView {
    /// Genesis set, valset nonce 0. The only public construction path.
    pub fn genesis(entries: Vec<ValidatorSetEntry>) -> BridgeResult<Self> {
        Self::build(0, entries)
    }

    pub(crate) fn build(valset_nonce: u64, entries: Vec<ValidatorSetEntry>) -> BridgeResult<Self> {
        if entries.is_empty() {
            return Err(BridgeError::InvalidValidatorSet("empty".into()));
        }

        let mut by_id = BTreeMap::new();
        let mut addresses = BTreeSet::new();
        let mut total_power: u64 = 0;

        for entry in entries {
            if entry.power == 0 {
                return Err(BridgeError::InvalidValidatorSet(format!(
                    "{} has zero power",
                    entry.validator
                )));
            }
            if !addresses.insert(entry.foreign_address) {
                return Err(BridgeError::InvalidValidatorSet(format!(
                    "duplicate foreign address {}",
                    entry.foreign_address
                )));
            }
            total_power = total_power.checked_add(entry.power).ok_or_else(|| {
                BridgeError::InvalidValidatorSet("total power overflows".into())
            })?;
            if by_id.insert(entry.validator, entry).is_some() {
                return Err(BridgeError::InvalidValidatorSet(format!(
                    "duplicate validator {}",
                    entry.validator
                )));
            }
        }

        let mut ordered: Vec<&ValidatorSetEntry> = by_id.values().collect();
        ordered.sort_by(|a, b| {
            b.power
                .cmp(&a.power)
                .then_with(|| a.foreign_address.cmp(&b.foreign_address))
        });
        let canonical = ordered.iter().map(|e| e.validator).collect();

        Ok(Self {
            valset_nonce,
            entries: by_id,
            canonical,
            total_power,
        })
    }

    /// Valset nonce of this snapshot.
    pub fn valset_nonce(&self) -> u64 {
        self.valset_nonce
    }

    /// Sum of all members' power.
    pub fn total_power(&self) -> u64 {
        self.total_power
    }

    /// Power of a validator, 0 if not a member.
    pub fn power_of(&self, validator: &ValidatorId) -> u64 {
        self.entries.get(validator).map(|e| e.power).unwrap_or(0)
    }

    /// Check if validator is in set.
    pub fn contains(&self, validator: &ValidatorId) -> bool {
        self.entries.contains_key(validator)
    }

    /// Registered signing address of a validator.
    pub fn foreign_address_of(&self, validator: &ValidatorId) -> Option<EthAddress> {
        self.entries.get(validator).map(|e| e.foreign_address)
    }

    /// Power that must be reached under `policy`.
    pub fn threshold(&self, policy: &ThresholdPolicy) -> u64 {
        policy.required_power(self.total_power)
    }

    /// Members in canonical order.
    pub fn members(&self) -> impl Iterator<Item = &ValidatorSetEntry> + '_ {
        self.canonical.iter().filter_map(|v| self.entries.get(v))
    }

    /// Position of a validator in canonical order.
    pub fn position_of(&self, validator: &ValidatorId) -> Option<usize> {
        self.canonical.iter().position(|v| v == validator)
    }

    /// `(foreign address, power)` tuples in canonical order.
    pub fn valset_members(&self) -> Vec<ValsetMember> {
        self.members()
            .map(|e| ValsetMember {
                foreign_address: e.foreign_address,
                power: e.power,
            })
            .collect()
    }

    /// Number of validators.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty. A built view never is.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outgoing artifact proposing a new signing set to the foreign contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValsetUpdate {
    /// Proposed snapshot, carrying its own valset nonce
    pub set: ValidatorSetView,
    /// Digest the current set signs
    pub checkpoint: Hash,
    /// Lifecycle state
    pub state: ArtifactState,
}

impl ValsetUpdate {
    /// Validate the proposed set and compute its checkpoint.
    pub fn new(
        params: &CheckpointParams,
        valset_nonce: u64,
        entries: Vec<ValidatorSetEntry>,
    ) -> BridgeResult<Self> {
        let set = ValidatorSetView::build(valset_nonce, entries)?;
        let members = set.valset_members();
        let checkpoint = compute_checkpoint(
            params,
            valset_nonce,
            &CheckpointPayload::ValsetUpdate { members: &members },
        );
        Ok(Self {
            set,
            checkpoint,
            state: ArtifactState::PendingSignatures,
        })
    }

    /// Artifact identity.
    pub fn artifact_id(&self) -> ArtifactId {
        ArtifactId::valset(self.set.valset_nonce())
    }

    /// Valset nonce.
    pub fn valset_nonce(&self) -> u64 {
        self.set.valset_nonce()
    }

    /// Whether the contract-reported members are exactly this proposal.
    pub fn matches_members(&self, members: &[ValsetMember]) -> bool {
        self.set.valset_members() == members
    }
}
