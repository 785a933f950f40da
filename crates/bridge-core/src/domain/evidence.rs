//! Equivocation evidence
//!
//! Kept for a penalty module outside the core to act on; the conflicting
//! submission itself is always rejected.

use super::value_objects::{ArtifactId, ValidatorId};
use bridge_crypto::Hash;
use serde::{Deserialize, Serialize};

/// What the validator equivocated on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Conflict {
    /// Two different event hashes claimed at one event nonce.
    Claim {
        /// Event nonce
        nonce: u64,
        /// Hash the validator voted for first
        first: Hash,
        /// Conflicting hash
        second: Hash,
    },
    /// Two different valid signatures over one artifact.
    Signature {
        /// Signed artifact
        artifact: ArtifactId,
        /// Stored signature
        first: Vec<u8>,
        /// Conflicting signature
        second: Vec<u8>,
    },
}

/// Proof that a validator issued conflicting submissions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquivocationEvidence {
    /// Offending validator
    pub validator: ValidatorId,
    /// The two conflicting submissions
    pub conflict: Conflict,
}
