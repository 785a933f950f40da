//! # Nonce Sequencer
//!
//! Strictly increasing nonces per stream, plus each validator's last claimed
//! event nonce.

use super::errors::{BridgeError, BridgeResult};
use super::value_objects::ValidatorId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A nonce stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stream {
    /// Attested foreign events; the last value is the low-water mark.
    InboundEvents,
    /// Outgoing batch nonces.
    OutgoingBatches,
    /// Validator set update nonces.
    ValsetUpdates,
    /// Outgoing transfer ids.
    OutgoingTransfers,
}

impl Stream {
    /// All streams, in key order.
    pub const ALL: [Stream; 4] = [
        Stream::InboundEvents,
        Stream::OutgoingBatches,
        Stream::ValsetUpdates,
        Stream::OutgoingTransfers,
    ];

    /// Byte used in persisted keys.
    pub fn as_byte(&self) -> u8 {
        match self {
            Stream::InboundEvents => 1,
            Stream::OutgoingBatches => 2,
            Stream::ValsetUpdates => 3,
            Stream::OutgoingTransfers => 4,
        }
    }
}

/// Per-stream and per-validator nonce bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NonceSequencer {
    last: BTreeMap<Stream, u64>,
    last_claimed: BTreeMap<ValidatorId, u64>,
}

impl NonceSequencer {
    /// Fresh sequencer: every stream starts at 0, first nonce is 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last nonce used or attested in a stream.
    pub fn last(&self, stream: Stream) -> u64 {
        self.last.get(&stream).copied().unwrap_or(0)
    }

    /// Next nonce the stream will accept.
    pub fn next_expected(&self, stream: Stream) -> u64 {
        self.last(stream).saturating_add(1)
    }

    /// Take the next nonce of a locally assigned stream.
    pub fn assign_next(&mut self, stream: Stream) -> u64 {
        let next = self.next_expected(stream);
        self.last.insert(stream, next);
        next
    }

    /// Move a stream forward to `nonce`, which must be strictly greater.
    pub fn advance(&mut self, stream: Stream, nonce: u64) -> BridgeResult<()> {
        let last = self.last(stream);
        if nonce <= last {
            return Err(BridgeError::OutOfOrder {
                expected: last.saturating_add(1),
                got: nonce,
            });
        }
        self.last.insert(stream, nonce);
        Ok(())
    }

    /// Last event nonce a validator had a claim accepted for.
    pub fn last_claimed(&self, validator: &ValidatorId) -> u64 {
        self.last_claimed.get(validator).copied().unwrap_or(0)
    }

    /// Next event nonce a validator may claim.
    ///
    /// Validators that fell behind the low-water mark skip straight past it.
    pub fn expected_for(&self, validator: &ValidatorId) -> u64 {
        self.last_claimed(validator)
            .max(self.last(Stream::InboundEvents))
            .saturating_add(1)
    }

    /// Record an accepted claim. Never moves a validator backwards.
    pub fn record_claim(&mut self, validator: ValidatorId, nonce: u64) {
        let entry = self.last_claimed.entry(validator).or_insert(0);
        *entry = (*entry).max(nonce);
    }

    /// Non-zero stream positions, for persistence.
    pub fn streams(&self) -> impl Iterator<Item = (Stream, u64)> + '_ {
        self.last.iter().map(|(s, n)| (*s, *n))
    }

    /// Per-validator claim positions, for persistence.
    pub fn claims(&self) -> impl Iterator<Item = (ValidatorId, u64)> + '_ {
        self.last_claimed.iter().map(|(v, n)| (*v, *n))
    }

    /// Rebuild from persisted positions.
    pub fn restore(
        streams: impl IntoIterator<Item = (Stream, u64)>,
        claims: impl IntoIterator<Item = (ValidatorId, u64)>,
    ) -> Self {
        Self {
            last: streams.into_iter().collect(),
            last_claimed: claims.into_iter().collect(),
        }
    }
}
