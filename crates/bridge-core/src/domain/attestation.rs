//! # Event Attestor
//!
//! Accumulates validator votes per `(nonce, event_hash)` and finalizes events
//! strictly in nonce order once voting power exceeds the threshold.
//!
//! ## Ordering rules
//!
//! - A validator may claim `max(last_claimed, low_water) + 1`, or any nonce
//!   that already has an open attestation (late corroboration).
//! - Only the attestation at `low_water + 1` may finalize. Later nonces that
//!   already crossed the threshold finalize in cascade behind it.

use super::errors::{BridgeError, BridgeResult};
use super::events::ForeignEvent;
use super::evidence::{Conflict, EquivocationEvidence};
use super::nonce::{NonceSequencer, Stream};
use super::validator_set::ValidatorSetView;
use super::value_objects::ValidatorId;
use crate::config::ThresholdPolicy;
use bridge_crypto::Hash;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Vote accumulation for one event hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    /// The claimed event
    pub event: ForeignEvent,
    /// Cached `event.event_hash()`
    pub event_hash: Hash,
    /// Validator -> power at vote time. Later votes overwrite.
    pub votes: BTreeMap<ValidatorId, u64>,
    /// Flips to true exactly once
    pub observed: bool,
}

impl Attestation {
    fn new(event: ForeignEvent, event_hash: Hash) -> Self {
        Self {
            event,
            event_hash,
            votes: BTreeMap::new(),
            observed: false,
        }
    }

    /// Sum of current vote entries.
    pub fn power(&self) -> u64 {
        self.votes
            .values()
            .fold(0u64, |acc, p| acc.saturating_add(*p))
    }
}

/// Result of an accepted claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttestationStatus {
    /// Not finalized yet. `power >= required` means waiting on a predecessor.
    Pending {
        /// Accumulated power on this hash
        power: u64,
        /// Power needed under the active policy
        required: u64,
    },
    /// This claim finalized the event.
    Finalized,
    /// The event was already finalized; nothing changed.
    AlreadyFinalized,
}

/// Status of a claim plus every event it finalized, in nonce order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimOutcome {
    /// Status of the claimed event
    pub status: AttestationStatus,
    /// Events finalized by this claim, including cascaded successors
    pub finalized: Vec<ForeignEvent>,
}

/// Attestation store and vote-counting rules.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventAttestor {
    attestations: BTreeMap<u64, BTreeMap<Hash, Attestation>>,
}

impl EventAttestor {
    /// Create an empty attestor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted attestations.
    pub fn restore(attestations: impl IntoIterator<Item = Attestation>) -> Self {
        let mut attestor = Self::new();
        for att in attestations {
            attestor
                .attestations
                .entry(att.event.nonce)
                .or_default()
                .insert(att.event_hash, att);
        }
        attestor
    }

    /// Process one validator's claim.
    pub fn submit_claim(
        &mut self,
        validator: ValidatorId,
        event: ForeignEvent,
        view: &ValidatorSetView,
        policy: &ThresholdPolicy,
        nonces: &mut NonceSequencer,
    ) -> BridgeResult<ClaimOutcome> {
        if !view.contains(&validator) {
            return Err(BridgeError::UnknownValidator(validator));
        }
        event.validate()?;

        let nonce = event.nonce;
        let event_hash = event.event_hash();
        let low_water = nonces.last(Stream::InboundEvents);

        if nonce <= low_water {
            let finalized = self
                .get(nonce, &event_hash)
                .map(|att| att.observed)
                .unwrap_or(false);
            if finalized {
                debug!(
                    "[bridge] claim by {} for finalized event {} ignored",
                    validator, nonce
                );
                return Ok(ClaimOutcome {
                    status: AttestationStatus::AlreadyFinalized,
                    finalized: Vec::new(),
                });
            }
            return Err(BridgeError::OutOfOrder {
                expected: nonces.expected_for(&validator),
                got: nonce,
            });
        }

        let expected = nonces.expected_for(&validator);
        let open = self.attestations.contains_key(&nonce);
        if nonce != expected && !open {
            return Err(BridgeError::OutOfOrder {
                expected,
                got: nonce,
            });
        }

        if let Some(conflict) = self.conflicting_vote(nonce, &event_hash, &validator) {
            warn!(
                "[bridge] equivocation by {} at event nonce {}",
                validator, nonce
            );
            return Err(BridgeError::Equivocation(Box::new(EquivocationEvidence {
                validator,
                conflict: Conflict::Claim {
                    nonce,
                    first: conflict,
                    second: event_hash,
                },
            })));
        }

        let power = view.power_of(&validator);
        let attestation = self
            .attestations
            .entry(nonce)
            .or_default()
            .entry(event_hash)
            .or_insert_with(|| Attestation::new(event, event_hash));
        attestation.votes.insert(validator, power);
        let accumulated = attestation.power();
        nonces.record_claim(validator, nonce);

        debug!(
            "[bridge] claim accepted: validator={} nonce={} power={}/{}",
            validator,
            nonce,
            accumulated,
            view.total_power()
        );

        let finalized = self.finalize_ready(view, policy, nonces)?;
        let status = if finalized.iter().any(|e| e.nonce == nonce) {
            AttestationStatus::Finalized
        } else {
            AttestationStatus::Pending {
                power: accumulated,
                required: view.threshold(policy),
            }
        };

        Ok(ClaimOutcome { status, finalized })
    }

    /// Finalize `low_water + 1` and every successor already over threshold.
    fn finalize_ready(
        &mut self,
        view: &ValidatorSetView,
        policy: &ThresholdPolicy,
        nonces: &mut NonceSequencer,
    ) -> BridgeResult<Vec<ForeignEvent>> {
        let mut finalized = Vec::new();
        loop {
            let next = nonces.next_expected(Stream::InboundEvents);
            let Some(candidates) = self.attestations.get_mut(&next) else {
                break;
            };
            let Some(winner) = candidates
                .values_mut()
                .find(|att| policy.is_reached(att.power(), view.total_power()))
            else {
                break;
            };

            winner.observed = true;
            nonces.advance(Stream::InboundEvents, next)?;
            info!(
                "[bridge] event finalized: nonce={} kind={} hash={}",
                next,
                winner.event.kind.name(),
                hex::encode(&winner.event_hash[..8])
            );
            finalized.push(winner.event.clone());
        }
        Ok(finalized)
    }

    /// Hash this validator already voted for at `nonce`, if different.
    fn conflicting_vote(&self, nonce: u64, hash: &Hash, validator: &ValidatorId) -> Option<Hash> {
        self.attestations.get(&nonce).and_then(|by_hash| {
            by_hash
                .iter()
                .find(|(h, att)| *h != hash && att.votes.contains_key(validator))
                .map(|(h, _)| *h)
        })
    }

    /// Look up one attestation.
    pub fn get(&self, nonce: u64, event_hash: &Hash) -> Option<&Attestation> {
        self.attestations.get(&nonce)?.get(event_hash)
    }

    /// All attestations at a nonce.
    pub fn at_nonce(&self, nonce: u64) -> impl Iterator<Item = &Attestation> + '_ {
        self.attestations
            .get(&nonce)
            .into_iter()
            .flat_map(|by_hash| by_hash.values())
    }

    /// Every attestation, nonce ascending.
    pub fn iter(&self) -> impl Iterator<Item = &Attestation> + '_ {
        self.attestations.values().flat_map(|by_hash| by_hash.values())
    }

    /// Drop every attestation with nonce `<= cutoff`. Returns how many went.
    pub fn prune_through(&mut self, cutoff: u64) -> usize {
        let kept = self.attestations.split_off(&cutoff.saturating_add(1));
        let removed: usize = self.attestations.values().map(|m| m.len()).sum();
        self.attestations = kept;
        removed
    }

    /// Number of attestations held.
    pub fn len(&self) -> usize {
        self.attestations.values().map(|m| m.len()).sum()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.attestations.is_empty()
    }
}
