//! # Bridge Configuration
//!
//! Every validator must run with an identical configuration: the bridge id,
//! codec version and threshold all feed into checkpoints and finalization.

use crate::domain::errors::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};

/// Checkpoint encodings this build can produce.
pub const SUPPORTED_CHECKPOINT_VERSIONS: &[u8] = &[1];

/// Fraction of total power that must be *exceeded* to finalize an
/// attestation or make an artifact executable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdPolicy {
    /// Fraction numerator
    pub numerator: u64,
    /// Fraction denominator
    pub denominator: u64,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            numerator: 2,
            denominator: 3,
        }
    }
}

impl ThresholdPolicy {
    /// `power / total > numerator / denominator`, in integer arithmetic.
    pub fn is_reached(&self, power: u64, total: u64) -> bool {
        if total == 0 || self.denominator == 0 {
            return false;
        }
        (power as u128) * (self.denominator as u128) > (total as u128) * (self.numerator as u128)
    }

    /// Smallest power for which `is_reached` holds.
    pub fn required_power(&self, total: u64) -> u64 {
        if self.denominator == 0 {
            return u64::MAX;
        }
        let floor = (total as u128) * (self.numerator as u128) / (self.denominator as u128);
        u64::try_from(floor + 1).unwrap_or(u64::MAX)
    }

    /// Reject fractions that cannot tolerate any faulty power.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.denominator == 0 || self.numerator >= self.denominator {
            return Err(BridgeError::InvalidConfig(format!(
                "threshold {}/{} must be a proper fraction",
                self.numerator, self.denominator
            )));
        }
        if self.numerator.saturating_mul(2) < self.denominator {
            return Err(BridgeError::InvalidConfig(format!(
                "threshold {}/{} is below one half",
                self.numerator, self.denominator
            )));
        }
        Ok(())
    }
}

/// Bridge core configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Identifier of this bridge deployment, word 0 of every checkpoint
    #[serde(with = "hex::serde")]
    pub bridge_id: [u8; 32],
    /// Checkpoint encoding version
    pub checkpoint_version: u8,
    /// Finalization / executability threshold
    pub threshold: ThresholdPolicy,
    /// Upper bound on transfers per batch
    pub max_batch_size: usize,
    /// Foreign blocks after the last observed height before a batch times out
    pub batch_timeout_blocks: u64,
    /// Attestations this many nonces below the low-water mark are pruned
    pub attestation_prune_window: u64,
    /// New batches must pay more than the best pending batch for the token
    pub require_fee_improvement: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bridge_id: [0u8; 32],
            checkpoint_version: 1,
            threshold: ThresholdPolicy::default(),
            max_batch_size: 100,
            batch_timeout_blocks: 43_200,
            attestation_prune_window: 1_000,
            require_fee_improvement: true,
        }
    }
}

impl BridgeConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> BridgeResult<Self> {
        let config: BridgeConfig =
            serde_json::from_str(json).map_err(|e| BridgeError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field is usable.
    pub fn validate(&self) -> BridgeResult<()> {
        if !SUPPORTED_CHECKPOINT_VERSIONS.contains(&self.checkpoint_version) {
            return Err(BridgeError::InvalidConfig(format!(
                "unsupported checkpoint version {}",
                self.checkpoint_version
            )));
        }
        self.threshold.validate()?;
        if self.max_batch_size == 0 {
            return Err(BridgeError::InvalidConfig(
                "max_batch_size must be positive".to_string(),
            ));
        }
        if self.batch_timeout_blocks == 0 {
            return Err(BridgeError::InvalidConfig(
                "batch_timeout_blocks must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
