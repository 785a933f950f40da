//! # Ports Layer
//!
//! - **Inbound (Driving)**: API that the bridge core calls

pub mod inbound;
