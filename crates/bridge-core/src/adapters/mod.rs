//! # Adapters
//!
//! Concrete implementations of the outbound ports.

pub mod deposit_ledger;
pub mod local_signer;
pub mod signature_verifier;

pub use deposit_ledger::InMemoryDepositLedger;
pub use local_signer::LocalCheckpointSigner;
pub use signature_verifier::EcdsaSignatureVerifier;
