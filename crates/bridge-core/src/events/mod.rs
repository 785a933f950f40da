//! Events emitted by the bridge core for the surrounding chain.

pub mod outgoing;

pub use outgoing::BridgeEvent;
