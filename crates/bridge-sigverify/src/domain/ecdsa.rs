//! # ECDSA Verification (secp256k1)
//!
//! Pure domain logic for checkpoint signature verification.
//!
//! ## Security Notes
//!
//! - **Malleability Prevention (EIP-2)**: S must be STRICTLY LESS THAN SECP256K1_HALF_ORDER
//! - **Scalar Range Validation**: R and S must be in [1, n-1]
//! - **Constant-Time Operations**: Uses `subtle` crate for side-channel resistance
//! - Uses k256 crate for cryptographic operations

use super::entities::{
    Address, BatchVerificationResult, EcdsaSignature, VerificationRequest, VerificationResult,
};
use super::errors::SignatureError;
use bridge_crypto::{address_from_verifying_key, eth_signed_message_hash, Hash};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use subtle::{Choice, ConstantTimeEq};
use tracing::debug;

/// secp256k1 curve order n
/// n = 0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// Half of the secp256k1 curve order (for malleability check).
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

// =============================================================================
// CHECKPOINT VERIFICATION
// =============================================================================

/// Verify that `signature` over `checkpoint` was produced by `signer`.
///
/// Any malformed input (wrong length, bad recovery id, out-of-range scalars,
/// high S) yields `false`.
pub fn verify_checkpoint(checkpoint: &Hash, signer: &Address, signature: &[u8]) -> bool {
    match recover_checkpoint_signer(checkpoint, signature) {
        Ok(recovered) => recovered == *signer,
        Err(error) => {
            debug!(%error, "[bridge-sigverify] rejected checkpoint signature");
            false
        }
    }
}

/// Recover the address that signed `checkpoint` under the EIP-191 prefix.
pub fn recover_checkpoint_signer(
    checkpoint: &Hash,
    signature: &[u8],
) -> Result<Address, SignatureError> {
    let signature = EcdsaSignature::from_bytes(signature)?;
    let digest = eth_signed_message_hash(checkpoint);
    let result = verify_ecdsa(&digest, &signature);
    match (result.recovered_address, result.error) {
        (Some(address), _) => Ok(address),
        (None, Some(error)) => Err(error),
        (None, None) => Err(SignatureError::RecoveryFailed),
    }
}

/// Verify a single request, including the expected-signer comparison.
pub fn verify_request(req: &VerificationRequest) -> VerificationResult {
    match recover_checkpoint_signer(&req.checkpoint, &req.signature) {
        Ok(recovered) if recovered == req.expected_signer => VerificationResult::valid(recovered),
        Ok(recovered) => VerificationResult::invalid(SignatureError::SignerMismatch {
            expected: req.expected_signer,
            actual: recovered,
        }),
        Err(error) => VerificationResult::invalid(error),
    }
}

/// Verify a whole signature set in parallel.
///
/// Results keep request order, so callers can map failures back to validators.
pub fn batch_verify_checkpoints(requests: &[VerificationRequest]) -> BatchVerificationResult {
    use rayon::prelude::*;

    let results: Vec<VerificationResult> = requests.par_iter().map(verify_request).collect();

    BatchVerificationResult::from_results(results)
}

// =============================================================================
// CORE VERIFICATION FUNCTIONS
// =============================================================================

/// Verify an ECDSA signature over a prehashed message and recover the signer.
///
/// Validations performed:
/// 1. R is in valid range [1, n-1]
/// 2. S is in valid range [1, n-1]
/// 3. S is in lower half per EIP-2 malleability protection
/// 4. Recovery ID (v) is valid (0, 1, 27, or 28)
/// 5. Public key recovery succeeds
pub fn verify_ecdsa(message_hash: &Hash, signature: &EcdsaSignature) -> VerificationResult {
    if !is_valid_scalar(&signature.r) || !is_valid_scalar(&signature.s) {
        return VerificationResult::invalid(SignatureError::InvalidFormat);
    }

    if !is_low_s(&signature.s) {
        return VerificationResult::invalid(SignatureError::MalleableSignature);
    }

    match recover_address(message_hash, signature) {
        Ok(address) => VerificationResult::valid(address),
        Err(e) => VerificationResult::invalid(e),
    }
}

/// Recover the signer's address from a signature over a prehashed message.
pub fn recover_address(
    message_hash: &Hash,
    signature: &EcdsaSignature,
) -> Result<Address, SignatureError> {
    let recovery_id = parse_recovery_id(signature.v)?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&signature.r);
    sig_bytes[32..].copy_from_slice(&signature.s);
    let sig = Signature::from_slice(&sig_bytes).map_err(|_| SignatureError::InvalidFormat)?;

    let recovered_key = VerifyingKey::recover_from_prehash(message_hash, &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;

    Ok(address_from_verifying_key(&recovered_key))
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Constant-time `a < b` over big-endian 32-byte values.
fn ct_less_than(a: &[u8; 32], b: &[u8; 32]) -> Choice {
    let mut less = Choice::from(0u8);
    let mut greater = Choice::from(0u8);

    for i in 0..32 {
        let not_decided = !(less | greater);
        less |= not_decided & Choice::from((a[i] < b[i]) as u8);
        greater |= not_decided & Choice::from((a[i] > b[i]) as u8);
    }

    less
}

/// Check if S value is in lower half of curve order (EIP-2 malleability protection).
///
/// Strict inequality: `s == n/2` is rejected too.
fn is_low_s(s: &[u8; 32]) -> bool {
    ct_less_than(s, &SECP256K1_HALF_ORDER).into()
}

/// Check if a scalar value is in valid range [1, n-1] for ECDSA.
fn is_valid_scalar(scalar: &[u8; 32]) -> bool {
    let mut is_zero = Choice::from(1u8);
    for &byte in scalar {
        is_zero &= byte.ct_eq(&0u8);
    }

    (!is_zero & ct_less_than(scalar, &SECP256K1_ORDER)).into()
}

/// Parse recovery ID from v value.
///
/// Valid v values: 0, 1, 27, 28
fn parse_recovery_id(v: u8) -> Result<RecoveryId, SignatureError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(SignatureError::InvalidRecoveryId(v)),
    };

    RecoveryId::try_from(id).map_err(|_| SignatureError::InvalidRecoveryId(v))
}

// =============================================================================
// UNIT TESTS
// =============================================================================
