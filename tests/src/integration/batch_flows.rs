//! # Batch Flows
//!
//! Outgoing transfers through batching, signing, execution, supersession and
//! timeout, observed through committed-state queries.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use bridge_core::{
        committed_state, ArtifactId, ArtifactState, BridgeApi, BridgeConfig, BridgeError,
        BridgeEvent, BridgeQuery, BridgeQueryApi, CheckpointSigner, EthAddress, InMemoryKVStore,
        OutgoingArtifact, SignatureOutcome, SignatureRecord,
    };
    use primitive_types::U256;

    #[test]
    fn test_batch_lifecycle_through_queries() {
        let vals = validators(&[34, 33, 33]);
        let alice = account("alice");
        let mut bridge = bridge(config(), &vals, funded_ledger(&[alice.clone()], 10_000));
        let state = committed_state(InMemoryKVStore::new());
        let query = BridgeQuery::new(state.clone());

        let low = queue_transfer(&mut bridge, &alice, 1);
        let mid = queue_transfer(&mut bridge, &alice, 5);
        let high = queue_transfer(&mut bridge, &alice, 9);

        let batch = bridge.build_batch(TOKEN, 2).unwrap();
        let ids: Vec<u64> = batch.transactions.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![high, mid]);
        bridge.commit(&state).unwrap();

        assert_eq!(query.pending_batches(&TOKEN).unwrap(), vec![batch.clone()]);
        assert!(query.executable_artifacts().unwrap().is_empty());
        let pending: Vec<u64> = query
            .pending_transfers(&TOKEN)
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(pending, vec![low]);

        let artifact = batch.artifact_id();
        sign(&mut bridge, &[&vals[1], &vals[0]], artifact).unwrap();
        bridge.commit(&state).unwrap();

        let executable = query.executable_artifacts().unwrap();
        assert_eq!(executable.len(), 1);
        assert_eq!(executable[0].id(), artifact);
        let signers: Vec<_> = query
            .signatures_for(&artifact)
            .unwrap()
            .into_iter()
            .map(|r| r.validator)
            .collect();
        assert_eq!(signers, vec![vals[0].id, vals[1].id]);

        attest(&mut bridge, &[&vals[0], &vals[1]], &batch_executed(1, 20, batch.batch_nonce)).unwrap();
        bridge.commit(&state).unwrap();

        assert!(query.pending_batches(&TOKEN).unwrap().is_empty());
        assert!(query.executable_artifacts().unwrap().is_empty());
        assert_eq!(bridge.batch(batch.batch_nonce).unwrap().state, ArtifactState::Executed);
    }

    #[test]
    fn test_identical_pools_build_identical_checkpoints() {
        let vals = validators(&[34, 33, 33]);
        let alice = account("alice");
        let bob = account("bob");

        let build = || {
            let mut bridge = bridge(
                config(),
                &vals,
                funded_ledger(&[alice.clone(), bob.clone()], 10_000),
            );
            queue_transfer(&mut bridge, &alice, 4);
            queue_transfer(&mut bridge, &bob, 4);
            queue_transfer(&mut bridge, &alice, 7);
            bridge.build_batch(TOKEN, 10).unwrap()
        };

        let first = build();
        let second = build();
        assert_eq!(first, second);
        assert_eq!(hex::encode(first.checkpoint), hex::encode(second.checkpoint));
    }

    #[test]
    fn test_threshold_flips_at_exact_signature() {
        let vals = validators(&[25, 25, 25, 25]);
        let alice = account("alice");
        let mut bridge = bridge(config(), &vals, funded_ledger(&[alice.clone()], 10_000));
        queue_transfer(&mut bridge, &alice, 1);
        let artifact = bridge.build_batch(TOKEN, 10).unwrap().artifact_id();

        let mut seen = Vec::new();
        for v in &vals {
            sign(&mut bridge, &[v], artifact).unwrap();
            seen.push(bridge.has_threshold(&artifact));
        }
        assert_eq!(seen, vec![false, false, true, true]);
    }

    #[test]
    fn test_stale_and_duplicate_signatures() {
        let vals = validators(&[34, 33, 33]);
        let alice = account("alice");
        let mut bridge = bridge(config(), &vals, funded_ledger(&[alice.clone()], 10_000));
        queue_transfer(&mut bridge, &alice, 3);
        let batch = bridge.build_batch(TOKEN, 10).unwrap();
        let artifact = batch.artifact_id();

        let record = bridge.sign_artifact(vals[0].id, artifact, &vals[0].signer).unwrap();
        assert_eq!(bridge.submit_signature(record.clone()).unwrap(), SignatureOutcome::Stored);
        assert_eq!(bridge.submit_signature(record).unwrap(), SignatureOutcome::Duplicate);
        sign(&mut bridge, &[&vals[1]], artifact).unwrap();
        assert_eq!(bridge.signatures_for(&artifact).len(), 2);

        attest(&mut bridge, &[&vals[0], &vals[1]], &batch_executed(1, 5, batch.batch_nonce)).unwrap();

        let late = SignatureRecord {
            artifact,
            validator: vals[2].id,
            signer_address: vals[2].signer.signer_address(),
            signature: vec![0u8; 65],
        };
        assert!(matches!(
            bridge.submit_signature(late),
            Err(BridgeError::StaleArtifact { state: ArtifactState::Executed, .. })
        ));
        assert!(matches!(
            bridge.sign_artifact(vals[2].id, artifact, &vals[2].signer),
            Err(BridgeError::StaleArtifact { .. })
        ));
        assert!(matches!(
            sign(&mut bridge, &[&vals[2]], ArtifactId::batch(42)),
            Err(BridgeError::UnknownArtifact(_))
        ));
    }

    #[test]
    fn test_execution_supersedes_lower_batches() {
        let vals = validators(&[34, 33, 33]);
        let alice = account("alice");
        let mut bridge = bridge(config(), &vals, funded_ledger(&[alice.clone()], 10_000));

        let first_id = queue_transfer(&mut bridge, &alice, 5);
        let first = bridge.build_batch(TOKEN, 10).unwrap();
        queue_transfer(&mut bridge, &alice, 6);
        let second = bridge.build_batch(TOKEN, 10).unwrap();
        bridge.drain_events();

        attest(&mut bridge, &[&vals[0], &vals[1]], &batch_executed(1, 5, second.batch_nonce)).unwrap();

        assert_eq!(bridge.batch(first.batch_nonce).unwrap().state, ArtifactState::Superseded);
        assert_eq!(bridge.batch(second.batch_nonce).unwrap().state, ArtifactState::Executed);
        assert!(bridge.pool().get(first_id).is_some());
        assert!(bridge.drain_events().contains(&BridgeEvent::ArtifactSuperseded {
            artifact: first.artifact_id(),
            released: 1,
        }));

        // Released transfers can be cancelled again
        bridge.cancel_transfer(&alice, first_id).unwrap();
        assert_eq!(bridge.ledger().balance(&alice, &TOKEN), U256::from(10_000u64 - 106));
    }

    #[test]
    fn test_timed_out_batch_rebatches_with_fresh_timeout() {
        let vals = validators(&[34, 33, 33]);
        let alice = account("alice");
        let mut bridge = bridge(config(), &vals, funded_ledger(&[alice.clone()], 10_000));

        let id = queue_transfer(&mut bridge, &alice, 5);
        let first = bridge.build_batch(TOKEN, 10).unwrap();
        assert_eq!(first.timeout_height, 100);

        attest(&mut bridge, &[&vals[0], &vals[1]], &deposit(1, 150, &alice, 1)).unwrap();
        assert_eq!(bridge.batch(first.batch_nonce).unwrap().state, ArtifactState::TimedOut);

        let second = bridge.build_batch(TOKEN, 10).unwrap();
        assert_eq!(second.batch_nonce, 2);
        assert_eq!(second.timeout_height, 250);
        assert_eq!(second.transactions[0].id, id);
        assert_ne!(second.checkpoint, first.checkpoint);
    }

    #[test]
    fn test_batch_size_capped_by_config() {
        let vals = validators(&[34, 33, 33]);
        let alice = account("alice");
        let mut bridge = bridge(
            BridgeConfig {
                max_batch_size: 2,
                ..config()
            },
            &vals,
            funded_ledger(&[alice.clone()], 10_000),
        );
        for fee in 1..=4 {
            queue_transfer(&mut bridge, &alice, fee);
        }

        let batch = bridge.build_batch(TOKEN, 50).unwrap();
        assert_eq!(batch.transactions.len(), 2);
        assert_eq!(bridge.pool().len(), 2);
        assert!(matches!(
            bridge.build_batch(EthAddress([0x99; 20]), 10),
            Err(BridgeError::NoPendingTransfers(_))
        ));

        let artifact = OutgoingArtifact::Batch(batch);
        assert_eq!(artifact.state(), ArtifactState::PendingSignatures);
    }
}
