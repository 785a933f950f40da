//! Fuzz target for checkpoint signature verification.
//!
//! Submitted signatures are adversarial input; verification must answer
//! `false` for garbage and never panic.
//!
//! ## Running
//!
//! ```bash
//! cd crates/bridge-sigverify
//! cargo +nightly fuzz run fuzz_checkpoint_verify
//! ```

#![no_main]

use bridge_sigverify::{CheckpointSignatureApi, EcdsaCheckpointVerifier};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, arbitrary::Arbitrary)]
struct FuzzInput {
    checkpoint: [u8; 32],
    signer: [u8; 20],
    /// Arbitrary length on purpose: length checks are part of the target.
    signature: Vec<u8>,
}

fuzz_target!(|input: FuzzInput| {
    let verifier = EcdsaCheckpointVerifier;

    let first = verifier.verify(&input.checkpoint, &input.signer, &input.signature);
    let second = verifier.verify(&input.checkpoint, &input.signer, &input.signature);
    assert_eq!(first, second);

    match verifier.recover_signer(&input.checkpoint, &input.signature) {
        Ok(recovered) => assert_eq!(first, recovered == input.signer),
        Err(_) => assert!(!first),
    }
});
