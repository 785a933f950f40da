//! # Persistence
//!
//! Commit, restart and continue: a restored bridge must be indistinguishable
//! from one that never stopped.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use bridge_core::domain::store_keys::signature_key;
    use bridge_core::{
        committed_state, ArtifactState, AttestationStatus, BatchOperation, BridgeApi, BridgeError,
        EcdsaSignatureVerifier, InMemoryKVStore, KVStoreError, KeyValueStore,
    };

    #[test]
    fn test_restored_bridge_continues_identically() {
        let vals = validators(&[34, 33, 33]);
        let alice = account("alice");
        let ledger = funded_ledger(&[alice.clone()], 10_000);
        let mut original = bridge(config(), &vals, ledger.clone());

        attest(&mut original, &[&vals[0], &vals[1]], &deposit(1, 10, &alice, 5)).unwrap();
        original.submit_claim(vals[0].id, deposit(2, 11, &alice, 6)).unwrap();
        assert!(matches!(
            original.submit_claim(vals[0].id, deposit(2, 11, &alice, 7)),
            Err(BridgeError::Equivocation(_))
        ));
        assert_eq!(original.evidence().len(), 1);
        queue_transfer(&mut original, &alice, 3);
        let artifact = original.build_batch(TOKEN, 10).unwrap().artifact_id();
        sign(&mut original, &[&vals[0]], artifact).unwrap();
        queue_transfer(&mut original, &alice, 8);

        let state = committed_state(InMemoryKVStore::new());
        original.commit(&state).unwrap();

        let mut restored = TestBridge::restore(
            config(),
            &*state.read(),
            original.ledger().clone(),
            EcdsaSignatureVerifier::new(),
        )
        .unwrap();
        assert_eq!(restored.evidence(), original.evidence());
        assert_eq!(restored.last_attested_nonce(), 1);

        for bridge in [&mut original, &mut restored] {
            assert_eq!(
                bridge.submit_claim(vals[1].id, deposit(2, 11, &alice, 6)).unwrap(),
                AttestationStatus::Finalized
            );
            sign(bridge, &[&vals[1]], artifact).unwrap();
            assert_eq!(bridge.batch(1).unwrap().state, ArtifactState::Executable);
        }

        let left = committed_state(InMemoryKVStore::new());
        let right = committed_state(InMemoryKVStore::new());
        original.commit(&left).unwrap();
        restored.commit(&right).unwrap();
        assert_eq!(
            left.read().prefix_scan(&[]).unwrap(),
            right.read().prefix_scan(&[]).unwrap()
        );
        assert_eq!(original.ledger(), restored.ledger());
    }

    #[test]
    fn test_restore_rejects_tampered_signature() {
        let vals = validators(&[34, 33, 33]);
        let alice = account("alice");
        let mut bridge = bridge(config(), &vals, funded_ledger(&[alice.clone()], 10_000));
        queue_transfer(&mut bridge, &alice, 3);
        let artifact = bridge.build_batch(TOKEN, 10).unwrap().artifact_id();
        sign(&mut bridge, &[&vals[0]], artifact).unwrap();

        let state = committed_state(InMemoryKVStore::new());
        bridge.commit(&state).unwrap();

        let key = signature_key(&artifact, &vals[0].id);
        let mut value = state.read().get(&key).unwrap().unwrap();
        // Second to last byte is inside `s`
        let at = value.len() - 2;
        value[at] ^= 0x01;
        state
            .write()
            .atomic_batch_write(vec![BatchOperation::put(key, value)])
            .unwrap();

        let result = TestBridge::restore(
            config(),
            &*state.read(),
            funded_ledger(&[], 0),
            EcdsaSignatureVerifier::new(),
        );
        assert!(matches!(
            result,
            Err(BridgeError::Storage(KVStoreError::Corruption(_)))
        ));
    }

    #[test]
    fn test_restore_applies_config_validation() {
        let vals = validators(&[34, 33, 33]);
        let bridge = bridge(config(), &vals, funded_ledger(&[], 0));
        let state = committed_state(InMemoryKVStore::new());
        bridge.commit(&state).unwrap();

        let mut bad = config();
        bad.max_batch_size = 0;
        assert!(matches!(
            TestBridge::restore(bad, &*state.read(), funded_ledger(&[], 0), EcdsaSignatureVerifier::new()),
            Err(BridgeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_pruned_attestations_leave_the_store() {
        let vals = validators(&[34, 33, 33]);
        let alice = account("alice");
        let mut bridge = bridge(
            bridge_core::BridgeConfig {
                attestation_prune_window: 1,
                ..config()
            },
            &vals,
            funded_ledger(&[], 0),
        );
        let state = committed_state(InMemoryKVStore::new());

        for nonce in 1..=4 {
            attest(&mut bridge, &[&vals[0], &vals[1]], &deposit(nonce, nonce, &alice, 1)).unwrap();
            bridge.commit(&state).unwrap();
        }

        let attestations = state
            .read()
            .prefix_scan(&[bridge_core::domain::store_keys::ATTESTATION_PREFIX])
            .unwrap();
        assert_eq!(attestations.len(), 1);

        // Replays of pruned nonces are out of order
        assert!(matches!(
            bridge.submit_claim(vals[2].id, deposit(1, 1, &alice, 1)),
            Err(BridgeError::OutOfOrder { .. })
        ));
    }
}
