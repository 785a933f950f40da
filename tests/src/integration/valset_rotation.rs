//! # Validator Set Rotation
//!
//! A proposed set is signed by the active set, executed on the foreign
//! chain, and only becomes active once that execution is attested.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use bridge_core::{
        committed_state, ArtifactState, BridgeApi, BridgeError, BridgeQuery, BridgeQueryApi,
        InMemoryKVStore,
    };

    #[test]
    fn test_rotation_replaces_signing_set() {
        let vals = validators(&[34, 33, 33]);
        let d = TestValidator::new(4, 40);
        let alice = account("alice");
        let mut bridge = bridge(config(), &vals, funded_ledger(&[alice.clone()], 10_000));

        // Drop A, add D
        let next = [&vals[1], &vals[2], &d];
        let update = bridge
            .request_valset_update(next.iter().map(|v| v.entry()).collect())
            .unwrap();
        sign(&mut bridge, &[&vals[0], &vals[1]], update.artifact_id()).unwrap();
        assert_eq!(bridge.valset_update(1).unwrap().state, ArtifactState::Executable);

        let members = update.set.valset_members();
        attest(&mut bridge, &[&vals[0], &vals[1]], &valset_updated(1, 30, 1, members)).unwrap();
        assert_eq!(bridge.valset().valset_nonce(), 1);
        assert_eq!(bridge.valset().total_power(), 106);

        // A is no longer a member
        assert!(matches!(
            bridge.submit_claim(vals[0].id, deposit(2, 31, &alice, 1)),
            Err(BridgeError::UnknownValidator(_))
        ));

        queue_transfer(&mut bridge, &alice, 2);
        let artifact = bridge.build_batch(TOKEN, 10).unwrap().artifact_id();
        assert!(matches!(
            sign(&mut bridge, &[&vals[0]], artifact),
            Err(BridgeError::UnknownValidator(_))
        ));

        sign(&mut bridge, &[&vals[1], &vals[2]], artifact).unwrap();
        assert!(!bridge.has_threshold(&artifact));
        sign(&mut bridge, &[&d], artifact).unwrap();
        assert!(bridge.has_threshold(&artifact));

        let state = committed_state(InMemoryKVStore::new());
        bridge.commit(&state).unwrap();
        let query = BridgeQuery::new(state);
        assert_eq!(query.active_valset().unwrap().unwrap().valset_nonce(), 1);
        assert_eq!(
            query.latest_valset_update().unwrap().unwrap().state,
            ArtifactState::Executed
        );
    }

    #[test]
    fn test_activation_supersedes_older_proposals() {
        let vals = validators(&[34, 33, 33]);
        let mut bridge = bridge(config(), &vals, funded_ledger(&[], 0));

        let older = bridge
            .request_valset_update(vec![vals[0].entry(), vals[1].entry()])
            .unwrap();
        let newer = bridge
            .request_valset_update(vec![vals[1].entry(), vals[2].entry()])
            .unwrap();
        assert_eq!((older.valset_nonce(), newer.valset_nonce()), (1, 2));

        let event = valset_updated(1, 5, 2, newer.set.valset_members());
        attest(&mut bridge, &[&vals[0], &vals[1]], &event).unwrap();

        assert_eq!(bridge.valset().valset_nonce(), 2);
        assert_eq!(bridge.valset_update(1).unwrap().state, ArtifactState::Superseded);
        assert_eq!(bridge.valset_update(2).unwrap().state, ArtifactState::Executed);
        assert!(matches!(
            sign(&mut bridge, &[&vals[1]], older.artifact_id()),
            Err(BridgeError::StaleArtifact { .. })
        ));
    }

    #[test]
    fn test_unmatched_activation_is_ignored() {
        let vals = validators(&[34, 33, 33]);
        let mut bridge = bridge(config(), &vals, funded_ledger(&[], 0));
        bridge
            .request_valset_update(vec![vals[0].entry(), vals[1].entry()])
            .unwrap();

        // Reported members disagree with the proposal
        let wrong = valset_updated(1, 5, 1, vec![vals[2].member()]);
        attest(&mut bridge, &[&vals[0], &vals[1]], &wrong).unwrap();
        assert_eq!(bridge.valset().valset_nonce(), 0);

        // No proposal exists at this nonce
        let unknown = valset_updated(2, 6, 9, vec![vals[0].member()]);
        attest(&mut bridge, &[&vals[0], &vals[1]], &unknown).unwrap();
        assert_eq!(bridge.valset().valset_nonce(), 0);
        assert_eq!(bridge.last_attested_nonce(), 2);
    }

    #[test]
    fn test_invalid_proposals_consume_no_nonce() {
        let vals = validators(&[34, 33, 33]);
        let mut bridge = bridge(config(), &vals, funded_ledger(&[], 0));

        assert!(matches!(
            bridge.request_valset_update(Vec::new()),
            Err(BridgeError::InvalidValidatorSet(_))
        ));
        let mut zero = vals[0].entry();
        zero.power = 0;
        assert!(matches!(
            bridge.request_valset_update(vec![zero]),
            Err(BridgeError::InvalidValidatorSet(_))
        ));
        assert!(matches!(
            bridge.request_valset_update(vec![vals[0].entry(), vals[0].entry()]),
            Err(BridgeError::InvalidValidatorSet(_))
        ));

        let update = bridge.request_valset_update(vec![vals[2].entry()]).unwrap();
        assert_eq!(update.valset_nonce(), 1);
    }

    #[test]
    fn test_signatures_follow_contract_order() {
        // Equal powers fall back to address order
        let vals = validators(&[10, 30, 10, 30]);
        let alice = account("alice");
        let mut bridge = bridge(config(), &vals, funded_ledger(&[alice.clone()], 10_000));
        queue_transfer(&mut bridge, &alice, 1);
        let artifact = bridge.build_batch(TOKEN, 10).unwrap().artifact_id();

        sign(&mut bridge, &[&vals[0], &vals[1], &vals[2], &vals[3]], artifact).unwrap();
        let ordered: Vec<_> = bridge
            .signatures_for(&artifact)
            .into_iter()
            .map(|r| (r.signer_address, bridge.valset().power_of(&r.validator)))
            .collect();

        let mut expected = ordered.clone();
        expected.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        assert_eq!(ordered, expected);
        assert_eq!(ordered.len(), 4);
    }
}
