//! # Persisted Key Schema
//!
//! Pure key derivation for every persisted value. Nonces and ids are
//! big-endian so a prefix scan returns them in ascending order.
//!
//! ```text
//! 0x01 | nonce(8) | event_hash(32)            -> Attestation
//! 0x02 | kind(1) | nonce(8)                   -> OutgoingArtifact
//! 0x03 | kind(1) | nonce(8) | validator(20)   -> SignatureRecord
//! 0x04 | id(8)                                -> pending OutgoingTransfer
//! 0x05 | stream(1)                            -> last nonce of stream (u64)
//! 0x06 | validator(20)                        -> last claimed event nonce (u64)
//! 0x07                                        -> active ValidatorSetView
//! 0x08 | index(8)                             -> EquivocationEvidence
//! 0x09 | token contract(20)                   -> Erc20Registration
//! 0x0A                                        -> last observed foreign height (u64)
//! ```

use super::nonce::Stream;
use super::value_objects::{ArtifactId, EthAddress, ValidatorId};
use bridge_crypto::Hash;

/// Attestation prefix.
pub const ATTESTATION_PREFIX: u8 = 0x01;
/// Outgoing artifact prefix.
pub const ARTIFACT_PREFIX: u8 = 0x02;
/// Signature record prefix.
pub const SIGNATURE_PREFIX: u8 = 0x03;
/// Pending transfer prefix.
pub const TRANSFER_PREFIX: u8 = 0x04;
/// Stream position prefix.
pub const STREAM_PREFIX: u8 = 0x05;
/// Per-validator last claim prefix.
pub const LAST_CLAIM_PREFIX: u8 = 0x06;
/// Active validator set key.
pub const ACTIVE_VALSET_KEY: [u8; 1] = [0x07];
/// Equivocation evidence prefix.
pub const EVIDENCE_PREFIX: u8 = 0x08;
/// ERC20 registration prefix.
pub const ERC20_PREFIX: u8 = 0x09;
/// Last observed foreign height key.
pub const LAST_OBSERVED_HEIGHT_KEY: [u8; 1] = [0x0A];

/// Every prefix the core owns, for full-state scans.
pub const ALL_PREFIXES: [u8; 10] = [
    ATTESTATION_PREFIX,
    ARTIFACT_PREFIX,
    SIGNATURE_PREFIX,
    TRANSFER_PREFIX,
    STREAM_PREFIX,
    LAST_CLAIM_PREFIX,
    ACTIVE_VALSET_KEY[0],
    EVIDENCE_PREFIX,
    ERC20_PREFIX,
    LAST_OBSERVED_HEIGHT_KEY[0],
];

/// `0x01 | nonce | event_hash`
pub fn attestation_key(nonce: u64, event_hash: &Hash) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + 8 + 32);
    key.push(ATTESTATION_PREFIX);
    key.extend_from_slice(&nonce.to_be_bytes());
    key.extend_from_slice(event_hash);
    key
}

/// `0x02 | kind | nonce`
pub fn artifact_key(artifact: &ArtifactId) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + 1 + 8);
    key.push(ARTIFACT_PREFIX);
    key.push(artifact.kind.as_byte());
    key.extend_from_slice(&artifact.nonce.to_be_bytes());
    key
}

/// `0x03 | kind | nonce | validator`
///
/// Derives a signature's storage slot from the artifact and the signing
/// validator, so existence checks are a single point lookup.
pub fn signature_key(artifact: &ArtifactId, validator: &ValidatorId) -> Vec<u8> {
    let mut key = signature_prefix(artifact);
    key.extend_from_slice(validator.as_bytes());
    key
}

/// `0x03 | kind | nonce`, the scan prefix for one artifact's signatures.
pub fn signature_prefix(artifact: &ArtifactId) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + 1 + 8 + 20);
    key.push(SIGNATURE_PREFIX);
    key.push(artifact.kind.as_byte());
    key.extend_from_slice(&artifact.nonce.to_be_bytes());
    key
}

/// `0x04 | id`
pub fn transfer_key(id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + 8);
    key.push(TRANSFER_PREFIX);
    key.extend_from_slice(&id.to_be_bytes());
    key
}

/// `0x05 | stream`
pub fn stream_key(stream: Stream) -> Vec<u8> {
    vec![STREAM_PREFIX, stream.as_byte()]
}

/// `0x06 | validator`
pub fn last_claim_key(validator: &ValidatorId) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + 20);
    key.push(LAST_CLAIM_PREFIX);
    key.extend_from_slice(validator.as_bytes());
    key
}

/// `0x08 | index`
pub fn evidence_key(index: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + 8);
    key.push(EVIDENCE_PREFIX);
    key.extend_from_slice(&index.to_be_bytes());
    key
}

/// `0x09 | token`
pub fn erc20_key(token: &EthAddress) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + 20);
    key.push(ERC20_PREFIX);
    key.extend_from_slice(token.as_bytes());
    key
}
