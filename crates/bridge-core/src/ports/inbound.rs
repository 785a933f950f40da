//! # Inbound Ports
//!
//! What the surrounding chain can ask of the bridge core.

use crate::domain::{
    ArtifactId, AttestationStatus, BridgeResult, ChainAccount, Erc20Registration, EthAddress,
    ForeignEvent, OutgoingArtifact, OutgoingBatch, OutgoingTransfer, SignatureOutcome,
    SignatureRecord, ValidatorId, ValidatorSetEntry, ValidatorSetView, ValsetUpdate,
};
use primitive_types::U256;

/// State-machine step API - inbound port.
///
/// Every call is one ordered transaction applied synchronously.
pub trait BridgeApi {
    /// A validator's claim about a foreign event.
    fn submit_claim(&mut self, validator: ValidatorId, event: ForeignEvent)
        -> BridgeResult<AttestationStatus>;

    /// Queue a transfer to the foreign chain. Returns its id.
    fn submit_transfer(
        &mut self,
        sender: ChainAccount,
        destination: EthAddress,
        token_contract: EthAddress,
        amount: U256,
        fee: U256,
    ) -> BridgeResult<u64>;

    /// Withdraw a transfer that is not yet in a batch.
    fn cancel_transfer(&mut self, sender: &ChainAccount, id: u64) -> BridgeResult<OutgoingTransfer>;

    /// Build the next batch for a token.
    fn build_batch(&mut self, token_contract: EthAddress, max_size: usize)
        -> BridgeResult<OutgoingBatch>;

    /// Open a validator set update for signing.
    fn request_valset_update(&mut self, entries: Vec<ValidatorSetEntry>)
        -> BridgeResult<ValsetUpdate>;

    /// A validator's signature over an artifact checkpoint.
    fn submit_signature(&mut self, record: SignatureRecord) -> BridgeResult<SignatureOutcome>;

    /// Whether threshold power has signed the artifact.
    fn has_threshold(&self, artifact: &ArtifactId) -> bool;

    /// Signatures on an artifact in canonical order.
    fn signatures_for(&self, artifact: &ArtifactId) -> Vec<SignatureRecord>;
}

/// Read-only query API over committed state - inbound port.
pub trait BridgeQueryApi {
    /// Live batches for a token, nonce ascending.
    fn pending_batches(&self, token_contract: &EthAddress) -> BridgeResult<Vec<OutgoingBatch>>;

    /// Artifacts relayers may submit now.
    fn executable_artifacts(&self) -> BridgeResult<Vec<OutgoingArtifact>>;

    /// Signatures on an artifact in canonical order.
    fn signatures_for(&self, artifact: &ArtifactId) -> BridgeResult<Vec<SignatureRecord>>;

    /// Highest finalized event nonce.
    fn last_attested_nonce(&self) -> BridgeResult<u64>;

    /// Most recent validator set update, whatever its state.
    fn latest_valset_update(&self) -> BridgeResult<Option<ValsetUpdate>>;

    /// Active validator set.
    fn active_valset(&self) -> BridgeResult<Option<ValidatorSetView>>;

    /// Unbatched transfers for a token, id ascending.
    fn pending_transfers(&self, token_contract: &EthAddress) -> BridgeResult<Vec<OutgoingTransfer>>;

    /// Registered metadata of a foreign token.
    fn erc20(&self, token_contract: &EthAddress) -> BridgeResult<Option<Erc20Registration>>;
}
