//! # Checkpoint Signature Verification
//!
//! Validates a claimed signer's signature over a checkpoint using secp256k1
//! public-key recovery. Pure and stateless: the bridge core calls it for every
//! submitted `SignatureRecord` and never stores a record that fails here.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): Pure cryptographic logic, no I/O
//! - **Ports Layer** (`ports/`): The `CheckpointSignatureApi` trait
//! - **Service Layer** (`service.rs`): `EcdsaCheckpointVerifier`, the default implementation
//!
//! ## Security Notes
//!
//! - **Malleability Prevention (EIP-2)**: Signatures with high S values are rejected
//! - **Adversarial Input**: Malformed signatures yield `false`, never a panic or a fatal error
//! - **EIP-191**: The recovered digest is `keccak256("\x19Ethereum Signed Message:\n32" || checkpoint)`

pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use domain::ecdsa::{
    batch_verify_checkpoints, recover_address, recover_checkpoint_signer, verify_checkpoint,
    verify_ecdsa,
};
pub use domain::entities::{
    Address, BatchVerificationResult, EcdsaSignature, VerificationRequest, VerificationResult,
};
pub use domain::errors::SignatureError;
pub use ports::inbound::CheckpointSignatureApi;
pub use service::EcdsaCheckpointVerifier;
