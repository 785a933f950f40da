//! # Bridge Service
//!
//! The deterministic state-machine step of the bridge.
//!
//! ## Architecture
//!
//! This service:
//! 1. Implements `BridgeApi`, one ordered transaction per call
//! 2. Applies every finalized foreign event exactly once, in nonce order
//! 3. Owns the lifecycle of outgoing artifacts (batches, valset updates)
//! 4. Persists its full state through `commit` and rebuilds it with `restore`
//!
//! A rejected call leaves the state untouched. The only exception is an
//! equivocation, whose evidence is recorded before the error is returned.

use crate::config::BridgeConfig;
use crate::domain::errors::{BridgeError, BridgeResult};
use crate::domain::store_keys::{
    artifact_key, attestation_key, erc20_key, evidence_key, last_claim_key, signature_key,
    stream_key, transfer_key, ACTIVE_VALSET_KEY, ALL_PREFIXES, ARTIFACT_PREFIX,
    ATTESTATION_PREFIX, ERC20_PREFIX, EVIDENCE_PREFIX, LAST_CLAIM_PREFIX,
    LAST_OBSERVED_HEIGHT_KEY, SIGNATURE_PREFIX, STREAM_PREFIX, TRANSFER_PREFIX,
};
use crate::domain::{
    invariant_checkpoint_matches, invariant_observed_prefix, invariant_single_token, Attestation,
    ArtifactId, ArtifactKind, ArtifactState, AttestationStatus, ChainAccount, CheckpointParams,
    Erc20Registration, EquivocationEvidence, EthAddress, EventAttestor, EventKind, ForeignEvent,
    NonceSequencer, OutgoingArtifact, OutgoingBatch, OutgoingBatchBuilder, OutgoingTransfer,
    SignatureOutcome, SignatureRecord, SignatureStore, Stream, TransferPool, ValidatorId,
    ValidatorSetEntry, ValidatorSetView, ValsetMember, ValsetUpdate,
};
use crate::events::BridgeEvent;
use crate::ports::inbound::BridgeApi;
use crate::ports::outbound::{
    BatchOperation, CheckpointSigner, CheckpointVerifier, DepositLedger, KVStoreError,
    KeyValueStore,
};
use crate::query::{decode, scan_values, CommittedState};
use bridge_crypto::Hash;
use primitive_types::U256;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// The bridge state machine.
pub struct BridgeService<L, V>
where
    L: DepositLedger,
    V: CheckpointVerifier,
{
    config: BridgeConfig,
    params: CheckpointParams,
    /// Active signing set
    valset: ValidatorSetView,
    /// Proposed sets by valset nonce
    valset_updates: BTreeMap<u64, ValsetUpdate>,
    nonces: NonceSequencer,
    attestor: EventAttestor,
    pool: TransferPool,
    batches: BTreeMap<u64, OutgoingBatch>,
    signatures: SignatureStore,
    evidence: Vec<EquivocationEvidence>,
    erc20: BTreeMap<EthAddress, Erc20Registration>,
    /// Highest foreign height carried by a finalized event
    last_observed_height: u64,
    /// Highest event nonce whose handler ran
    applied_through: u64,
    ledger: L,
    verifier: V,
    events: Vec<BridgeEvent>,
}

impl<L, V> BridgeService<L, V>
where
    L: DepositLedger,
    V: CheckpointVerifier,
{
    /// Start a bridge from its genesis validator set.
    pub fn new(
        config: BridgeConfig,
        genesis: ValidatorSetView,
        ledger: L,
        verifier: V,
    ) -> BridgeResult<Self> {
        config.validate()?;
        info!(
            "[bridge] starting with {} validators, total power {}",
            genesis.len(),
            genesis.total_power()
        );
        Ok(Self {
            params: CheckpointParams::from_config(&config),
            config,
            valset: genesis,
            valset_updates: BTreeMap::new(),
            nonces: NonceSequencer::new(),
            attestor: EventAttestor::new(),
            pool: TransferPool::new(),
            batches: BTreeMap::new(),
            signatures: SignatureStore::new(),
            evidence: Vec::new(),
            erc20: BTreeMap::new(),
            last_observed_height: 0,
            applied_through: 0,
            ledger,
            verifier,
            events: Vec::new(),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Active configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Active validator set.
    pub fn valset(&self) -> &ValidatorSetView {
        &self.valset
    }

    /// A batch by nonce, whatever its state.
    pub fn batch(&self, batch_nonce: u64) -> Option<&OutgoingBatch> {
        self.batches.get(&batch_nonce)
    }

    /// A validator set update by nonce, whatever its state.
    pub fn valset_update(&self, valset_nonce: u64) -> Option<&ValsetUpdate> {
        self.valset_updates.get(&valset_nonce)
    }

    /// Unbatched transfers.
    pub fn pool(&self) -> &TransferPool {
        &self.pool
    }

    /// Attestations still held.
    pub fn attestor(&self) -> &EventAttestor {
        &self.attestor
    }

    /// Recorded equivocations, in detection order.
    pub fn evidence(&self) -> &[EquivocationEvidence] {
        &self.evidence
    }

    /// Registered metadata of a foreign token.
    pub fn erc20(&self, token_contract: &EthAddress) -> Option<&Erc20Registration> {
        self.erc20.get(token_contract)
    }

    /// Highest finalized event nonce.
    pub fn last_attested_nonce(&self) -> u64 {
        self.nonces.last(Stream::InboundEvents)
    }

    /// Highest foreign height seen in a finalized event.
    pub fn last_observed_height(&self) -> u64 {
        self.last_observed_height
    }

    /// Deposit ledger collaborator.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Take the notifications emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<BridgeEvent> {
        std::mem::take(&mut self.events)
    }

    /// Sign an artifact's checkpoint on behalf of `validator`.
    ///
    /// Orchestrator-side helper; the record still goes through
    /// `submit_signature` like any other.
    pub fn sign_artifact<S: CheckpointSigner + ?Sized>(
        &self,
        validator: ValidatorId,
        artifact: ArtifactId,
        signer: &S,
    ) -> BridgeResult<SignatureRecord> {
        let (checkpoint, state) = self.artifact_status(&artifact)?;
        if state.is_terminal() {
            return Err(BridgeError::StaleArtifact { artifact, state });
        }
        Ok(SignatureRecord {
            artifact,
            validator,
            signer_address: signer.signer_address(),
            signature: signer.sign_checkpoint(&checkpoint)?,
        })
    }

    // =========================================================================
    // Artifact bookkeeping
    // =========================================================================

    fn artifact_status(&self, artifact: &ArtifactId) -> BridgeResult<(Hash, ArtifactState)> {
        match artifact.kind {
            ArtifactKind::Batch => self
                .batches
                .get(&artifact.nonce)
                .map(|b| (b.checkpoint, b.state)),
            ArtifactKind::ValsetUpdate => self
                .valset_updates
                .get(&artifact.nonce)
                .map(|u| (u.checkpoint, u.state)),
        }
        .ok_or(BridgeError::UnknownArtifact(*artifact))
    }

    /// Apply a lifecycle transition. False if the artifact is missing or the
    /// transition is not allowed.
    fn transition(&mut self, artifact: &ArtifactId, next: ArtifactState) -> bool {
        let state = match artifact.kind {
            ArtifactKind::Batch => self.batches.get_mut(&artifact.nonce).map(|b| &mut b.state),
            ArtifactKind::ValsetUpdate => self
                .valset_updates
                .get_mut(&artifact.nonce)
                .map(|u| &mut u.state),
        };
        match state {
            Some(state) if state.can_transition_to(next) => {
                *state = next;
                true
            }
            _ => false,
        }
    }

    /// Move a live batch to `terminal` and return its transfers to the pool.
    fn release_batch(&mut self, batch_nonce: u64, terminal: ArtifactState) -> usize {
        let Some(batch) = self.batches.get_mut(&batch_nonce) else {
            return 0;
        };
        if !batch.state.can_transition_to(terminal) {
            return 0;
        }
        batch.state = terminal;
        for transfer in &batch.transactions {
            self.pool.insert(transfer.clone());
        }
        batch.transactions.len()
    }

    /// Best total fee among live batches of a token.
    fn fee_floor(&self, token_contract: &EthAddress) -> Option<U256> {
        self.batches
            .values()
            .filter(|b| b.is_live() && b.token_contract == *token_contract)
            .map(|b| b.total_fee())
            .max()
    }

    fn record_evidence(&mut self, evidence: &EquivocationEvidence) {
        warn!(
            "[bridge] equivocation evidence recorded against {}",
            evidence.validator
        );
        self.evidence.push(evidence.clone());
        self.events
            .push(BridgeEvent::EquivocationDetected(evidence.clone()));
    }

    // =========================================================================
    // Finalized event handlers
    // =========================================================================

    /// Run the handler of one finalized event. Never fails: the event is
    /// final on the foreign chain, so a handler that cannot apply it is
    /// skipped and reported instead of holding back later nonces.
    fn apply_finalized(&mut self, event: ForeignEvent) {
        if event.nonce <= self.applied_through {
            warn!(
                "[bridge] finalized event {} already applied, skipping",
                event.nonce
            );
            return;
        }
        self.applied_through = event.nonce;
        self.last_observed_height = self.last_observed_height.max(event.observed_height);
        self.events.push(BridgeEvent::EventFinalized {
            nonce: event.nonce,
            event_hash: event.event_hash(),
        });

        let nonce = event.nonce;
        if let Some(reason) = event.payload_defect() {
            self.skip_event(nonce, reason);
        } else {
            match event.kind {
                EventKind::Deposit {
                    token_contract,
                    receiver,
                    amount,
                    ..
                } => self.on_deposit(nonce, token_contract, receiver, amount),
                EventKind::BatchExecuted {
                    token_contract,
                    batch_nonce,
                } => self.on_batch_executed(token_contract, batch_nonce),
                EventKind::ValsetUpdated {
                    valset_nonce,
                    members,
                } => self.on_valset_updated(valset_nonce, &members),
                EventKind::Erc20Deployed {
                    token_contract,
                    denom,
                    name,
                    symbol,
                    decimals,
                } => self.on_erc20_deployed(Erc20Registration {
                    token_contract,
                    denom,
                    name,
                    symbol,
                    decimals,
                    event_nonce: nonce,
                }),
            }
        }

        self.time_out_batches();
    }

    fn skip_event(&mut self, nonce: u64, reason: String) {
        warn!("[bridge] finalized event {} not applied: {}", nonce, reason);
        self.events.push(BridgeEvent::EventSkipped { nonce, reason });
    }

    fn on_deposit(
        &mut self,
        nonce: u64,
        token_contract: EthAddress,
        receiver: ChainAccount,
        amount: U256,
    ) {
        if let Err(e) = self.ledger.credit(&receiver, &token_contract, amount) {
            self.skip_event(nonce, e.to_string());
            return;
        }
        info!(
            "[bridge] deposit credited: nonce={} receiver={} amount={}",
            nonce, receiver, amount
        );
        self.events.push(BridgeEvent::DepositCredited {
            nonce,
            receiver,
            token_contract,
            amount,
        });
    }

    fn on_batch_executed(&mut self, token_contract: EthAddress, batch_nonce: u64) {
        match self.batches.get(&batch_nonce) {
            None => {
                warn!("[bridge] executed batch {} is unknown", batch_nonce);
                return;
            }
            Some(batch) if batch.token_contract != token_contract => {
                warn!(
                    "[bridge] executed batch {} reported for {}, built for {}",
                    batch_nonce, token_contract, batch.token_contract
                );
                return;
            }
            Some(_) => {}
        }

        let executed = ArtifactId::batch(batch_nonce);
        if self.transition(&executed, ArtifactState::Executed) {
            info!(
                "[bridge] batch executed: nonce={} token={}",
                batch_nonce, token_contract
            );
            self.events
                .push(BridgeEvent::ArtifactExecuted { artifact: executed });
        } else {
            warn!("[bridge] batch {} executed but already terminal", batch_nonce);
        }

        let lower: Vec<u64> = self
            .batches
            .range(..batch_nonce)
            .filter(|(_, b)| b.is_live() && b.token_contract == token_contract)
            .map(|(n, _)| *n)
            .collect();
        for nonce in lower {
            let released = self.release_batch(nonce, ArtifactState::Superseded);
            debug!(
                "[bridge] batch {} superseded, {} transfers released",
                nonce, released
            );
            self.events.push(BridgeEvent::ArtifactSuperseded {
                artifact: ArtifactId::batch(nonce),
                released,
            });
        }
    }

    fn on_valset_updated(&mut self, valset_nonce: u64, members: &[ValsetMember]) {
        if valset_nonce <= self.valset.valset_nonce() {
            debug!(
                "[bridge] valset {} not newer than active {}",
                valset_nonce,
                self.valset.valset_nonce()
            );
            return;
        }

        let Some(update) = self
            .valset_updates
            .get(&valset_nonce)
            .filter(|u| !u.state.is_terminal() && u.matches_members(members))
        else {
            warn!(
                "[bridge] attested valset {} has no matching pending update",
                valset_nonce
            );
            return;
        };

        self.valset = update.set.clone();
        let artifact = ArtifactId::valset(valset_nonce);
        self.transition(&artifact, ArtifactState::Executed);
        info!(
            "[bridge] validator set {} active: {} members, total power {}",
            valset_nonce,
            self.valset.len(),
            self.valset.total_power()
        );
        self.events.push(BridgeEvent::ArtifactExecuted { artifact });
        self.events
            .push(BridgeEvent::ValsetActivated { valset_nonce });

        let lower: Vec<u64> = self
            .valset_updates
            .range(..valset_nonce)
            .filter(|(_, u)| !u.state.is_terminal())
            .map(|(n, _)| *n)
            .collect();
        for nonce in lower {
            let artifact = ArtifactId::valset(nonce);
            if self.transition(&artifact, ArtifactState::Superseded) {
                self.events.push(BridgeEvent::ArtifactSuperseded {
                    artifact,
                    released: 0,
                });
            }
        }
    }

    fn on_erc20_deployed(&mut self, registration: Erc20Registration) {
        if self.erc20.contains_key(&registration.token_contract) {
            warn!(
                "[bridge] token {} already registered",
                registration.token_contract
            );
            return;
        }
        if self.erc20.values().any(|r| r.denom == registration.denom) {
            warn!(
                "[bridge] denom {} already has a foreign representation",
                registration.denom
            );
            return;
        }

        info!(
            "[bridge] erc20 registered: {} -> {}",
            registration.denom, registration.token_contract
        );
        self.events.push(BridgeEvent::Erc20Registered {
            token_contract: registration.token_contract,
            denom: registration.denom.clone(),
        });
        self.erc20.insert(registration.token_contract, registration);
    }

    fn time_out_batches(&mut self) {
        let height = self.last_observed_height;
        let expired: Vec<u64> = self
            .batches
            .values()
            .filter(|b| b.is_live() && height > b.timeout_height)
            .map(|b| b.batch_nonce)
            .collect();

        for batch_nonce in expired {
            let released = self.release_batch(batch_nonce, ArtifactState::TimedOut);
            info!(
                "[bridge] batch {} timed out at height {}, {} transfers released",
                batch_nonce, height, released
            );
            self.events.push(BridgeEvent::BatchTimedOut {
                batch_nonce,
                released,
            });
        }
    }

    fn prune_attestations(&mut self) {
        let low_water = self.nonces.last(Stream::InboundEvents);
        let window = self.config.attestation_prune_window;
        if low_water <= window {
            return;
        }
        let pruned = self.attestor.prune_through(low_water - window);
        if pruned > 0 {
            debug!(
                "[bridge] pruned {} attestations through nonce {}",
                pruned,
                low_water - window
            );
        }
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Every key/value pair describing the current state.
    fn snapshot(&self) -> BridgeResult<BTreeMap<Vec<u8>, Vec<u8>>> {
        let mut entries = BTreeMap::new();

        for att in self.attestor.iter() {
            entries.insert(
                attestation_key(att.event.nonce, &att.event_hash),
                bincode::serialize(att)?,
            );
        }
        for batch in self.batches.values() {
            let artifact = OutgoingArtifact::Batch(batch.clone());
            entries.insert(artifact_key(&artifact.id()), bincode::serialize(&artifact)?);
        }
        for update in self.valset_updates.values() {
            let artifact = OutgoingArtifact::ValsetUpdate(update.clone());
            entries.insert(artifact_key(&artifact.id()), bincode::serialize(&artifact)?);
        }
        for record in self.signatures.iter() {
            entries.insert(
                signature_key(&record.artifact, &record.validator),
                bincode::serialize(record)?,
            );
        }
        for transfer in self.pool.iter() {
            entries.insert(transfer_key(transfer.id), bincode::serialize(transfer)?);
        }
        for (stream, last) in self.nonces.streams() {
            entries.insert(stream_key(stream), bincode::serialize(&last)?);
        }
        for (validator, last) in self.nonces.claims() {
            entries.insert(last_claim_key(&validator), bincode::serialize(&last)?);
        }
        entries.insert(ACTIVE_VALSET_KEY.to_vec(), bincode::serialize(&self.valset)?);
        for (index, evidence) in self.evidence.iter().enumerate() {
            entries.insert(evidence_key(index as u64), bincode::serialize(evidence)?);
        }
        for registration in self.erc20.values() {
            entries.insert(
                erc20_key(&registration.token_contract),
                bincode::serialize(registration)?,
            );
        }
        entries.insert(
            LAST_OBSERVED_HEIGHT_KEY.to_vec(),
            bincode::serialize(&self.last_observed_height)?,
        );

        Ok(entries)
    }

    /// Publish the current state as one atomic write.
    ///
    /// Keys the state no longer contains (pruned attestations, batched
    /// transfers) are deleted in the same write.
    pub fn commit<S: KeyValueStore>(&self, committed: &CommittedState<S>) -> BridgeResult<()> {
        let entries = self.snapshot()?;
        let mut store = committed.write();

        let mut operations = Vec::new();
        for prefix in ALL_PREFIXES {
            for (key, _) in store.prefix_scan(&[prefix])? {
                if !entries.contains_key(&key) {
                    operations.push(BatchOperation::delete(key));
                }
            }
        }
        let deletes = operations.len();
        operations.extend(
            entries
                .into_iter()
                .map(|(key, value)| BatchOperation::put(key, value)),
        );

        debug!(
            "[bridge] commit: {} puts, {} deletes",
            operations.len() - deletes,
            deletes
        );
        store.atomic_batch_write(operations)?;
        Ok(())
    }

    /// Rebuild a service from a committed store.
    ///
    /// Every artifact checkpoint is recomputed and every stored signature is
    /// re-verified; a mismatch is reported as storage corruption.
    pub fn restore<S: KeyValueStore + ?Sized>(
        config: BridgeConfig,
        store: &S,
        ledger: L,
        verifier: V,
    ) -> BridgeResult<Self> {
        config.validate()?;
        let params = CheckpointParams::from_config(&config);

        let valset: ValidatorSetView = match store.get(&ACTIVE_VALSET_KEY)? {
            Some(bytes) => decode(&bytes)?,
            None => return Err(corrupt("missing active validator set".to_string())),
        };

        let mut batches = BTreeMap::new();
        let mut valset_updates = BTreeMap::new();
        for artifact in scan_values::<OutgoingArtifact, S>(store, &[ARTIFACT_PREFIX])? {
            invariant_checkpoint_matches(&artifact, &params)?;
            invariant_single_token(&artifact)?;
            match artifact {
                OutgoingArtifact::Batch(batch) => {
                    batches.insert(batch.batch_nonce, batch);
                }
                OutgoingArtifact::ValsetUpdate(update) => {
                    valset_updates.insert(update.valset_nonce(), update);
                }
            }
        }

        let mut streams = Vec::new();
        for (key, value) in store.prefix_scan(&[STREAM_PREFIX])? {
            let stream = key
                .get(1)
                .and_then(|b| Stream::ALL.iter().find(|s| s.as_byte() == *b))
                .ok_or_else(|| corrupt(format!("unknown stream key {}", hex::encode(&key))))?;
            streams.push((*stream, decode::<u64>(&value)?));
        }

        let mut claims = Vec::new();
        for (key, value) in store.prefix_scan(&[LAST_CLAIM_PREFIX])? {
            let bytes: [u8; 20] = key
                .get(1..)
                .and_then(|b| b.try_into().ok())
                .ok_or_else(|| corrupt(format!("malformed claim key {}", hex::encode(&key))))?;
            claims.push((ValidatorId(bytes), decode::<u64>(&value)?));
        }

        let nonces = NonceSequencer::restore(streams, claims);
        let attestor = EventAttestor::restore(scan_values::<Attestation, S>(
            store,
            &[ATTESTATION_PREFIX],
        )?);
        let low_water = nonces.last(Stream::InboundEvents);
        invariant_observed_prefix(&attestor, low_water)?;

        let records = scan_values::<SignatureRecord, S>(store, &[SIGNATURE_PREFIX])?;
        let mut items = Vec::with_capacity(records.len());
        for record in &records {
            let checkpoint = match record.artifact.kind {
                ArtifactKind::Batch => batches.get(&record.artifact.nonce).map(|b| b.checkpoint),
                ArtifactKind::ValsetUpdate => valset_updates
                    .get(&record.artifact.nonce)
                    .map(|u| u.checkpoint),
            }
            .ok_or_else(|| corrupt(format!("signature for missing {}", record.artifact)))?;
            items.push((checkpoint, record.signer_address, record.signature.clone()));
        }
        if let Some(index) = verifier.verify_all(&items).iter().position(|ok| !ok) {
            return Err(corrupt(format!(
                "stored signature by {} on {} does not verify",
                records[index].validator, records[index].artifact
            )));
        }

        let mut pool = TransferPool::new();
        for transfer in scan_values::<OutgoingTransfer, S>(store, &[TRANSFER_PREFIX])? {
            pool.insert(transfer);
        }

        let erc20 = scan_values::<Erc20Registration, S>(store, &[ERC20_PREFIX])?
            .into_iter()
            .map(|r| (r.token_contract, r))
            .collect();

        let last_observed_height = match store.get(&LAST_OBSERVED_HEIGHT_KEY)? {
            Some(bytes) => decode(&bytes)?,
            None => 0,
        };

        info!(
            "[bridge] restored: last event {}, {} batches, {} signatures, valset {}",
            low_water,
            batches.len(),
            records.len(),
            valset.valset_nonce()
        );

        Ok(Self {
            params,
            config,
            valset,
            valset_updates,
            nonces,
            attestor,
            pool,
            batches,
            signatures: SignatureStore::restore(records),
            evidence: scan_values(store, &[EVIDENCE_PREFIX])?,
            erc20,
            last_observed_height,
            applied_through: low_water,
            ledger,
            verifier,
            events: Vec::new(),
        })
    }
}

fn corrupt(message: String) -> BridgeError {
    BridgeError::Storage(KVStoreError::Corruption(message))
}

impl<L, V> BridgeApi for BridgeService<L, V>
where
    L: DepositLedger,
    V: CheckpointVerifier,
{
    fn submit_claim(
        &mut self,
        validator: ValidatorId,
        event: ForeignEvent,
    ) -> BridgeResult<AttestationStatus> {
        let outcome = match self.attestor.submit_claim(
            validator,
            event,
            &self.valset,
            &self.config.threshold,
            &mut self.nonces,
        ) {
            Ok(outcome) => outcome,
            Err(BridgeError::Equivocation(evidence)) => {
                self.record_evidence(&evidence);
                return Err(BridgeError::Equivocation(evidence));
            }
            Err(e) => return Err(e),
        };

        for event in outcome.finalized {
            self.apply_finalized(event);
        }
        self.prune_attestations();
        Ok(outcome.status)
    }

    fn submit_transfer(
        &mut self,
        sender: ChainAccount,
        destination: EthAddress,
        token_contract: EthAddress,
        amount: U256,
        fee: U256,
    ) -> BridgeResult<u64> {
        if !sender.is_well_formed() {
            return Err(BridgeError::InvalidTransfer(format!(
                "malformed sender {:?}",
                sender.as_str()
            )));
        }
        if amount.is_zero() {
            return Err(BridgeError::InvalidTransfer("zero amount".into()));
        }
        if token_contract == EthAddress::ZERO {
            return Err(BridgeError::InvalidTransfer("zero token contract".into()));
        }
        if destination == EthAddress::ZERO {
            return Err(BridgeError::InvalidTransfer("zero destination".into()));
        }
        let total = amount
            .checked_add(fee)
            .ok_or_else(|| BridgeError::InvalidTransfer("amount plus fee overflows".into()))?;

        self.ledger.debit(&sender, &token_contract, total)?;
        let id = self.nonces.assign_next(Stream::OutgoingTransfers);
        debug!(
            "[bridge] transfer {} queued: {} -> {} amount={} fee={}",
            id, sender, destination, amount, fee
        );
        self.pool.insert(OutgoingTransfer {
            id,
            sender,
            destination,
            token_contract,
            amount,
            fee,
        });
        self.events.push(BridgeEvent::TransferQueued { id, token_contract });
        Ok(id)
    }

    fn cancel_transfer(&mut self, sender: &ChainAccount, id: u64) -> BridgeResult<OutgoingTransfer> {
        let transfer = self.pool.get(id).ok_or(BridgeError::TransferNotFound(id))?;
        if transfer.sender != *sender {
            return Err(BridgeError::TransferNotOwned { id });
        }
        let total = transfer.amount.saturating_add(transfer.fee);
        self.ledger.refund(sender, &transfer.token_contract, total)?;

        let transfer = self.pool.remove(id).ok_or(BridgeError::TransferNotFound(id))?;
        debug!("[bridge] transfer {} cancelled by {}", id, sender);
        self.events.push(BridgeEvent::TransferCancelled { id });
        Ok(transfer)
    }

    fn build_batch(
        &mut self,
        token_contract: EthAddress,
        max_size: usize,
    ) -> BridgeResult<OutgoingBatch> {
        let fee_floor = if self.config.require_fee_improvement {
            self.fee_floor(&token_contract)
        } else {
            None
        };
        let builder = OutgoingBatchBuilder {
            params: &self.params,
            last_observed_height: self.last_observed_height,
            timeout_blocks: self.config.batch_timeout_blocks,
            fee_floor,
        };
        let batch = builder.build_batch(
            &mut self.pool,
            token_contract,
            max_size.min(self.config.max_batch_size),
            &mut self.nonces,
        )?;

        info!(
            "[bridge] batch built: nonce={} token={} transfers={} fee={} timeout={}",
            batch.batch_nonce,
            token_contract,
            batch.transactions.len(),
            batch.total_fee(),
            batch.timeout_height
        );
        self.events.push(BridgeEvent::ArtifactCreated {
            artifact: batch.artifact_id(),
            checkpoint: batch.checkpoint,
        });
        self.batches.insert(batch.batch_nonce, batch.clone());
        Ok(batch)
    }

    fn request_valset_update(
        &mut self,
        entries: Vec<ValidatorSetEntry>,
    ) -> BridgeResult<ValsetUpdate> {
        let valset_nonce = self.nonces.next_expected(Stream::ValsetUpdates);
        let update = ValsetUpdate::new(&self.params, valset_nonce, entries)?;
        self.nonces.assign_next(Stream::ValsetUpdates);

        info!(
            "[bridge] valset update requested: nonce={} members={} power={}",
            valset_nonce,
            update.set.len(),
            update.set.total_power()
        );
        self.events.push(BridgeEvent::ArtifactCreated {
            artifact: update.artifact_id(),
            checkpoint: update.checkpoint,
        });
        self.valset_updates.insert(valset_nonce, update.clone());
        Ok(update)
    }

    fn submit_signature(&mut self, record: SignatureRecord) -> BridgeResult<SignatureOutcome> {
        let artifact = record.artifact;
        let (checkpoint, state) = self.artifact_status(&artifact)?;
        if state.is_terminal() {
            debug!(
                "[bridge] stale signature from {} on {} ({:?})",
                record.validator, artifact, state
            );
            return Err(BridgeError::StaleArtifact { artifact, state });
        }

        let outcome = match self.signatures.add_signature(
            record,
            &checkpoint,
            &self.valset,
            &self.verifier,
        ) {
            Ok(outcome) => outcome,
            Err(BridgeError::Equivocation(evidence)) => {
                self.record_evidence(&evidence);
                return Err(BridgeError::Equivocation(evidence));
            }
            Err(e) => return Err(e),
        };

        if outcome == SignatureOutcome::Stored
            && state == ArtifactState::PendingSignatures
            && self.has_threshold(&artifact)
            && self.transition(&artifact, ArtifactState::Executable)
        {
            info!(
                "[bridge] {} executable with {}/{} power",
                artifact,
                self.signatures.signed_power(&artifact, &self.valset),
                self.valset.total_power()
            );
            self.events
                .push(BridgeEvent::ArtifactExecutable { artifact });
        }
        Ok(outcome)
    }

    fn has_threshold(&self, artifact: &ArtifactId) -> bool {
        self.signatures
            .has_threshold(artifact, &self.valset, &self.config.threshold)
    }

    fn signatures_for(&self, artifact: &ArtifactId) -> Vec<SignatureRecord> {
        self.signatures.signatures_for(artifact, &self.valset)
    }
}
