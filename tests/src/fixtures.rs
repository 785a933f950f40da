//! Shared fixtures for the scenario tests and benchmarks.

use bridge_core::{
    ArtifactId, AttestationStatus, BridgeApi, BridgeConfig, BridgeResult, BridgeService,
    ChainAccount, CheckpointSigner, DepositLedger, EcdsaSignatureVerifier, EthAddress, EventKind,
    ForeignEvent, InMemoryDepositLedger, LocalCheckpointSigner, SignatureOutcome, ValidatorId,
    ValidatorSetEntry, ValidatorSetView, ValsetMember,
};
use primitive_types::U256;
use std::sync::Once;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Token contract used by most scenarios.
pub const TOKEN: EthAddress = EthAddress([0x11; 20]);

/// Bridge under test.
pub type TestBridge = BridgeService<InMemoryDepositLedger, EcdsaSignatureVerifier>;

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per process. Honors `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_test_writer()
            .with_target(true);
        // Another harness may have installed one already
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init();
    });
}

/// A validator with its orchestrator key.
pub struct TestValidator {
    /// Chain-native identity
    pub id: ValidatorId,
    /// Checkpoint signing key
    pub signer: LocalCheckpointSigner,
    /// Voting power
    pub power: u64,
}

impl TestValidator {
    /// Deterministic validator derived from `seed` (must be non-zero).
    pub fn new(seed: u8, power: u64) -> Self {
        Self {
            id: ValidatorId([seed; 20]),
            signer: LocalCheckpointSigner::from_secret([seed; 32])
                .expect("non-zero seed is a valid secret"),
            power,
        }
    }

    /// Foreign address the validator signs with.
    pub fn address(&self) -> EthAddress {
        self.signer.signer_address()
    }

    /// Membership entry.
    pub fn entry(&self) -> ValidatorSetEntry {
        ValidatorSetEntry::new(self.id, self.address(), self.power)
    }

    /// Membership as the foreign contract reports it.
    pub fn member(&self) -> ValsetMember {
        ValsetMember {
            foreign_address: self.address(),
            power: self.power,
        }
    }
}

/// Validators with seeds 1, 2, 3, ... and the given powers.
pub fn validators(powers: &[u64]) -> Vec<TestValidator> {
    powers
        .iter()
        .enumerate()
        .map(|(i, power)| TestValidator::new(i as u8 + 1, *power))
        .collect()
}

/// Configuration shared by the scenarios.
pub fn config() -> BridgeConfig {
    BridgeConfig {
        bridge_id: [0x42; 32],
        batch_timeout_blocks: 100,
        ..BridgeConfig::default()
    }
}

/// Chain-native account.
pub fn account(name: &str) -> ChainAccount {
    ChainAccount::new(format!("bridge1{}", name)).expect("well-formed test account")
}

/// Ledger with `amount` of `TOKEN` for every account.
pub fn funded_ledger(accounts: &[ChainAccount], amount: u64) -> InMemoryDepositLedger {
    let mut ledger = InMemoryDepositLedger::new();
    for account in accounts {
        ledger
            .credit(account, &TOKEN, U256::from(amount))
            .expect("fresh ledger cannot overflow");
    }
    ledger
}

/// Bridge whose genesis set is `vals`.
pub fn bridge(config: BridgeConfig, vals: &[TestValidator], ledger: InMemoryDepositLedger) -> TestBridge {
    init_tracing();
    tracing::debug!("[bridge-tests] genesis with {} validators", vals.len());
    let genesis = ValidatorSetView::genesis(vals.iter().map(|v| v.entry()).collect())
        .expect("valid genesis set");
    BridgeService::new(config, genesis, ledger, EcdsaSignatureVerifier::new())
        .expect("valid configuration")
}

/// Deposit of `amount` of `TOKEN` to `receiver`.
pub fn deposit(nonce: u64, height: u64, receiver: &ChainAccount, amount: u64) -> ForeignEvent {
    ForeignEvent::new(
        nonce,
        height,
        EventKind::Deposit {
            token_contract: TOKEN,
            sender: EthAddress([0xEE; 20]),
            receiver: receiver.clone(),
            amount: U256::from(amount),
        },
    )
}

/// The foreign contract executed `batch_nonce` of `TOKEN`.
pub fn batch_executed(nonce: u64, height: u64, batch_nonce: u64) -> ForeignEvent {
    ForeignEvent::new(
        nonce,
        height,
        EventKind::BatchExecuted {
            token_contract: TOKEN,
            batch_nonce,
        },
    )
}

/// The foreign contract accepted valset `valset_nonce` with `members`.
pub fn valset_updated(nonce: u64, height: u64, valset_nonce: u64, members: Vec<ValsetMember>) -> ForeignEvent {
    ForeignEvent::new(
        nonce,
        height,
        EventKind::ValsetUpdated {
            valset_nonce,
            members,
        },
    )
}

/// Submit `event` from each validator in turn.
pub fn attest(
    bridge: &mut TestBridge,
    vals: &[&TestValidator],
    event: &ForeignEvent,
) -> BridgeResult<Vec<AttestationStatus>> {
    vals.iter()
        .map(|v| bridge.submit_claim(v.id, event.clone()))
        .collect()
}

/// Sign and submit `artifact` from each validator in turn.
pub fn sign(
    bridge: &mut TestBridge,
    vals: &[&TestValidator],
    artifact: ArtifactId,
) -> BridgeResult<Vec<SignatureOutcome>> {
    vals.iter()
        .map(|v| {
            let record = bridge.sign_artifact(v.id, artifact, &v.signer)?;
            bridge.submit_signature(record)
        })
        .collect()
}

/// Queue a transfer of 100 `TOKEN` to a fixed destination.
pub fn queue_transfer(bridge: &mut TestBridge, sender: &ChainAccount, fee: u64) -> u64 {
    bridge
        .submit_transfer(
            sender.clone(),
            EthAddress([0x22; 20]),
            TOKEN,
            U256::from(100u64),
            U256::from(fee),
        )
        .expect("funded transfer")
}
