//! # Bridge Crypto
//!
//! Cryptographic primitives shared by the bridge crates.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | Keccak-256 | Checkpoints, event hashes, EIP-191 digests |
//! | `ecdsa` | secp256k1 | Validator checkpoint signing (orchestrator side) |
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic nonces, low-S normalization (EIP-2)
//! - **Keccak-256**: the digest the foreign contract recomputes, byte for byte

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;

// Re-exports
pub use ecdsa::{address_from_verifying_key, RecoverableSignature, Secp256k1KeyPair};
pub use errors::CryptoError;
pub use hashing::{eth_signed_message_hash, keccak256, keccak256_many, Hash, Keccak256Hasher};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
