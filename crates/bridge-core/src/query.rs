//! # Committed-State Queries
//!
//! Read-only views for relayers and clients. Everything here decodes what
//! the last `BridgeService::commit` wrote, so readers never observe a step
//! in progress.

use crate::domain::errors::BridgeResult;
use crate::domain::store_keys::{
    erc20_key, signature_prefix, stream_key, ACTIVE_VALSET_KEY, ARTIFACT_PREFIX, EVIDENCE_PREFIX,
    TRANSFER_PREFIX,
};
use crate::domain::{
    order_signatures, ArtifactId, ArtifactKind, ArtifactState, Erc20Registration,
    EquivocationEvidence, EthAddress, OutgoingArtifact, OutgoingBatch, OutgoingTransfer,
    SignatureRecord, Stream, ValidatorSetView, ValsetUpdate,
};
use crate::ports::inbound::BridgeQueryApi;
use crate::ports::outbound::KeyValueStore;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Store shared between the stepping service and its readers.
pub type CommittedState<S> = Arc<RwLock<S>>;

/// Wrap a store for sharing.
pub fn committed_state<S: KeyValueStore>(store: S) -> CommittedState<S> {
    Arc::new(RwLock::new(store))
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> BridgeResult<T> {
    Ok(bincode::deserialize(bytes)?)
}

pub(crate) fn scan_values<T: DeserializeOwned, S: KeyValueStore + ?Sized>(
    store: &S,
    prefix: &[u8],
) -> BridgeResult<Vec<T>> {
    store
        .prefix_scan(prefix)?
        .iter()
        .map(|(_, value)| decode(value))
        .collect()
}

/// Query handle over committed state.
pub struct BridgeQuery<S: KeyValueStore> {
    state: CommittedState<S>,
}

impl<S: KeyValueStore> Clone for BridgeQuery<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: KeyValueStore> BridgeQuery<S> {
    /// Create a query handle.
    pub fn new(state: CommittedState<S>) -> Self {
        Self { state }
    }

    fn artifacts_of(&self, kind: ArtifactKind) -> BridgeResult<Vec<OutgoingArtifact>> {
        let store = self.state.read();
        scan_values(&*store, &[ARTIFACT_PREFIX, kind.as_byte()])
    }

    /// Every recorded equivocation, in detection order.
    pub fn equivocation_evidence(&self) -> BridgeResult<Vec<EquivocationEvidence>> {
        let store = self.state.read();
        scan_values(&*store, &[EVIDENCE_PREFIX])
    }
}

impl<S: KeyValueStore> BridgeQueryApi for BridgeQuery<S> {
    fn pending_batches(&self, token_contract: &EthAddress) -> BridgeResult<Vec<OutgoingBatch>> {
        Ok(self
            .artifacts_of(ArtifactKind::Batch)?
            .into_iter()
            .filter_map(|artifact| match artifact {
                OutgoingArtifact::Batch(batch)
                    if batch.is_live() && batch.token_contract == *token_contract =>
                {
                    Some(batch)
                }
                _ => None,
            })
            .collect())
    }

    fn executable_artifacts(&self) -> BridgeResult<Vec<OutgoingArtifact>> {
        let store = self.state.read();
        let artifacts: Vec<OutgoingArtifact> = scan_values(&*store, &[ARTIFACT_PREFIX])?;
        Ok(artifacts
            .into_iter()
            .filter(|a| a.state() == ArtifactState::Executable)
            .collect())
    }

    fn signatures_for(&self, artifact: &ArtifactId) -> BridgeResult<Vec<SignatureRecord>> {
        let store = self.state.read();
        let records: Vec<SignatureRecord> = scan_values(&*store, &signature_prefix(artifact))?;
        match store.get(&ACTIVE_VALSET_KEY)? {
            Some(bytes) => {
                let view: ValidatorSetView = decode(&bytes)?;
                Ok(order_signatures(records, &view))
            }
            None => Ok(records),
        }
    }

    fn last_attested_nonce(&self) -> BridgeResult<u64> {
        let store = self.state.read();
        match store.get(&stream_key(Stream::InboundEvents))? {
            Some(bytes) => decode(&bytes),
            None => Ok(0),
        }
    }

    fn latest_valset_update(&self) -> BridgeResult<Option<ValsetUpdate>> {
        Ok(self
            .artifacts_of(ArtifactKind::ValsetUpdate)?
            .into_iter()
            .filter_map(|artifact| match artifact {
                OutgoingArtifact::ValsetUpdate(update) => Some(update),
                OutgoingArtifact::Batch(_) => None,
            })
            .last())
    }

    fn active_valset(&self) -> BridgeResult<Option<ValidatorSetView>> {
        let store = self.state.read();
        store
            .get(&ACTIVE_VALSET_KEY)?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    fn pending_transfers(&self, token_contract: &EthAddress) -> BridgeResult<Vec<OutgoingTransfer>> {
        let store = self.state.read();
        let transfers: Vec<OutgoingTransfer> = scan_values(&*store, &[TRANSFER_PREFIX])?;
        Ok(transfers
            .into_iter()
            .filter(|t| t.token_contract == *token_contract)
            .collect())
    }

    fn erc20(&self, token_contract: &EthAddress) -> BridgeResult<Option<Erc20Registration>> {
        let store = self.state.read();
        store
            .get(&erc20_key(token_contract))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }
}
