//! End-to-end flows across the attestor, batch builder, signature store and
//! persistence.

pub mod attestation_flows;
pub mod batch_flows;
pub mod persistence;
pub mod valset_rotation;
