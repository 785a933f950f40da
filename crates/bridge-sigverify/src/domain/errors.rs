//! # Signature Errors
//!
//! Error types for checkpoint signature verification.

use thiserror::Error;

/// Errors that can occur during signature verification.
///
/// These never cross into the bridge core as fatal errors; the core only sees
/// whether verification succeeded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// Signature is not 65 bytes
    #[error("Invalid signature length: expected 65, got {0}")]
    InvalidLength(usize),

    /// R or S is zero or not below the curve order
    #[error("Invalid signature format")]
    InvalidFormat,

    /// Signature has high S value (EIP-2 malleability protection)
    #[error("Malleable signature (high S value)")]
    MalleableSignature,

    /// Invalid recovery ID (v must be 0, 1, 27, or 28)
    #[error("Invalid recovery ID: {0}")]
    InvalidRecoveryId(u8),

    /// Failed to recover public key from signature
    #[error("Failed to recover public key")]
    RecoveryFailed,

    /// Recovered signer does not match expected signer
    #[error("Signer mismatch: expected {expected:?}, got {actual:?}")]
    SignerMismatch {
        /// Address the caller claimed
        expected: [u8; 20],
        /// Address actually recovered
        actual: [u8; 20],
    },
}
