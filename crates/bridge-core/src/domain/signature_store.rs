//! # Signature Store
//!
//! Per-validator signatures over outgoing artifacts, indexed by
//! `(artifact, validator)`. A record is only stored after its signature
//! recovers to the validator's registered foreign address.

use super::errors::{BridgeError, BridgeResult};
use super::evidence::{Conflict, EquivocationEvidence};
use super::validator_set::ValidatorSetView;
use super::value_objects::{ArtifactId, EthAddress, ValidatorId};
use crate::config::ThresholdPolicy;
use crate::ports::outbound::CheckpointVerifier;
use bridge_crypto::Hash;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// One validator's signature over one artifact checkpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    /// Signed artifact
    pub artifact: ArtifactId,
    /// Signing validator
    pub validator: ValidatorId,
    /// Address the signature claims to come from
    pub signer_address: EthAddress,
    /// 65-byte `r || s || v`
    pub signature: Vec<u8>,
}

/// Successful ingestion outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureOutcome {
    /// New record stored.
    Stored,
    /// Identical record already present; nothing changed.
    Duplicate,
}

/// Indexed signature collection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignatureStore {
    records: BTreeMap<ArtifactId, BTreeMap<ValidatorId, SignatureRecord>>,
}

impl SignatureStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted records.
    pub fn restore(records: impl IntoIterator<Item = SignatureRecord>) -> Self {
        let mut store = Self::new();
        for record in records {
            store
                .records
                .entry(record.artifact)
                .or_default()
                .insert(record.validator, record);
        }
        store
    }

    /// Validate and store a signature over `checkpoint`.
    ///
    /// The caller resolves the artifact and rejects stale or unknown ones
    /// before calling.
    pub fn add_signature<V: CheckpointVerifier + ?Sized>(
        &mut self,
        record: SignatureRecord,
        checkpoint: &Hash,
        view: &ValidatorSetView,
        verifier: &V,
    ) -> BridgeResult<SignatureOutcome> {
        let registered = view
            .foreign_address_of(&record.validator)
            .ok_or(BridgeError::UnknownValidator(record.validator))?;

        if registered != record.signer_address {
            return Err(BridgeError::InvalidSignature {
                validator: record.validator,
                reason: "signer is not the validator's registered address",
            });
        }

        let existing = self.get(&record.artifact, &record.validator);
        if existing.map(|e| e.signature == record.signature).unwrap_or(false) {
            debug!(
                "[bridge] duplicate signature from {} on {}",
                record.validator, record.artifact
            );
            return Ok(SignatureOutcome::Duplicate);
        }

        if !verifier.verify(checkpoint, &record.signer_address, &record.signature) {
            return Err(BridgeError::InvalidSignature {
                validator: record.validator,
                reason: "signature does not recover to signer",
            });
        }

        if let Some(existing) = existing {
            warn!(
                "[bridge] equivocation by {} on {}",
                record.validator, record.artifact
            );
            return Err(BridgeError::Equivocation(Box::new(EquivocationEvidence {
                validator: record.validator,
                conflict: Conflict::Signature {
                    artifact: record.artifact,
                    first: existing.signature.clone(),
                    second: record.signature,
                },
            })));
        }

        debug!(
            "[bridge] signature stored: {} on {}",
            record.validator, record.artifact
        );
        self.records
            .entry(record.artifact)
            .or_default()
            .insert(record.validator, record);
        Ok(SignatureOutcome::Stored)
    }

    /// Power of current members that signed `artifact`.
    pub fn signed_power(&self, artifact: &ArtifactId, view: &ValidatorSetView) -> u64 {
        self.records
            .get(artifact)
            .map(|by_validator| {
                by_validator
                    .keys()
                    .fold(0u64, |acc, v| acc.saturating_add(view.power_of(v)))
            })
            .unwrap_or(0)
    }

    /// Whether signers of `artifact` hold threshold power under `policy`.
    pub fn has_threshold(
        &self,
        artifact: &ArtifactId,
        view: &ValidatorSetView,
        policy: &ThresholdPolicy,
    ) -> bool {
        policy.is_reached(self.signed_power(artifact, view), view.total_power())
    }

    /// Signatures on `artifact` in the signing set's canonical order.
    pub fn signatures_for(&self, artifact: &ArtifactId, view: &ValidatorSetView) -> Vec<SignatureRecord> {
        let records = self
            .records
            .get(artifact)
            .map(|by_validator| by_validator.values().cloned().collect())
            .unwrap_or_default();
        order_signatures(records, view)
    }

    /// Look up a single record.
    pub fn get(&self, artifact: &ArtifactId, validator: &ValidatorId) -> Option<&SignatureRecord> {
        self.records.get(artifact)?.get(validator)
    }

    /// Number of signatures on one artifact.
    pub fn count(&self, artifact: &ArtifactId) -> usize {
        self.records.get(artifact).map(|m| m.len()).unwrap_or(0)
    }

    /// Every record, artifact then validator order.
    pub fn iter(&self) -> impl Iterator<Item = &SignatureRecord> + '_ {
        self.records.values().flat_map(|m| m.values())
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.records.values().map(|m| m.len()).sum()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Sort records the way the foreign contract expects signatures: members by
/// power descending then address ascending, former members last by address.
pub fn order_signatures(
    mut records: Vec<SignatureRecord>,
    view: &ValidatorSetView,
) -> Vec<SignatureRecord> {
    records.sort_by(|a, b| {
        let pa = view.position_of(&a.validator).unwrap_or(usize::MAX);
        let pb = view.position_of(&b.validator).unwrap_or(usize::MAX);
        pa.cmp(&pb)
            .then_with(|| a.signer_address.cmp(&b.signer_address))
    });
    records
}
