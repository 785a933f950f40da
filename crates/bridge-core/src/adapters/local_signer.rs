//! Local checkpoint signer
//!
//! Holds a secp256k1 key in process, the way a validator's orchestrator
//! would. Used by tests and single-machine setups.

use crate::domain::errors::{BridgeError, BridgeResult};
use crate::domain::value_objects::EthAddress;
use crate::ports::outbound::CheckpointSigner;
use bridge_crypto::{Hash, Secp256k1KeyPair};

/// In-process EIP-191 checkpoint signer.
pub struct LocalCheckpointSigner {
    keypair: Secp256k1KeyPair,
}

impl LocalCheckpointSigner {
    /// Wrap an existing keypair.
    pub fn new(keypair: Secp256k1KeyPair) -> Self {
        Self { keypair }
    }

    /// Fresh random key.
    pub fn generate() -> Self {
        Self::new(Secp256k1KeyPair::generate())
    }

    /// Load from 32 secret bytes.
    pub fn from_secret(secret: [u8; 32]) -> BridgeResult<Self> {
        let keypair =
            Secp256k1KeyPair::from_bytes(secret).map_err(|e| BridgeError::Signing(e.to_string()))?;
        Ok(Self::new(keypair))
    }
}

impl CheckpointSigner for LocalCheckpointSigner {
    fn signer_address(&self) -> EthAddress {
        EthAddress(self.keypair.eth_address())
    }

    fn sign_checkpoint(&self, checkpoint: &Hash) -> BridgeResult<Vec<u8>> {
        self.keypair
            .sign_checkpoint(checkpoint)
            .map(|sig| sig.to_vec())
            .map_err(|e| BridgeError::Signing(e.to_string()))
    }
}
