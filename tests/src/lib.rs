//! # Validator Bridge Test Suite
//!
//! Cross-crate scenarios driving `bridge-core` with real secp256k1 signers.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # validators, configs, event builders, tracing init
//! └── integration/      # end-to-end flows
//!     ├── attestation_flows.rs
//!     ├── batch_flows.rs
//!     ├── valset_rotation.rs
//!     └── persistence.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p bridge-tests
//!
//! # One flow, with logs
//! RUST_LOG=debug cargo test -p bridge-tests integration::batch_flows
//!
//! # Benchmarks
//! cargo bench -p bridge-tests
//! ```

pub mod fixtures;
pub mod integration;
