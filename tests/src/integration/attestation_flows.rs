//! # Attestation Flows
//!
//! Foreign events crossing the threshold across validators, replicas and
//! committed-state readers.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use bridge_core::{
        committed_state, AttestationStatus, BridgeApi, BridgeError, BridgeEvent, BridgeQuery,
        BridgeQueryApi, EthAddress, EventKind, ForeignEvent, InMemoryDepositLedger,
        InMemoryKVStore, KeyValueStore, ThresholdPolicy,
    };
    use primitive_types::U256;

    // =========================================================================
    // FINALIZATION
    // =========================================================================

    #[test]
    fn test_finalization_is_order_independent() {
        let vals = validators(&[34, 33, 33]);
        let orders: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        let bob = account("bob");
        let policy = ThresholdPolicy::default();

        for order in orders {
            let mut bridge = bridge(config(), &vals, InMemoryDepositLedger::new());
            let event = deposit(1, 10, &bob, 500);

            let mut power = 0;
            let mut finalized_at = None;
            for (step, i) in order.iter().enumerate() {
                let status = bridge.submit_claim(vals[*i].id, event.clone()).unwrap();
                let already = finalized_at.is_some();
                power += vals[*i].power;

                match status {
                    AttestationStatus::Finalized => {
                        assert!(!already, "finalized twice for order {:?}", order);
                        assert!(policy.is_reached(power, 100));
                        finalized_at = Some(step);
                    }
                    AttestationStatus::AlreadyFinalized => assert!(already),
                    AttestationStatus::Pending { .. } => {
                        assert!(!policy.is_reached(power, 100));
                    }
                }
            }

            assert!(finalized_at.is_some(), "never finalized for order {:?}", order);
            assert_eq!(bridge.ledger().balance(&bob, &TOKEN), U256::from(500u64));
        }
    }

    #[test]
    fn test_cascade_finalizes_waiting_successor() {
        let vals = validators(&[34, 33, 33]);
        let mut bridge = bridge(config(), &vals, InMemoryDepositLedger::new());
        let bob = account("bob");
        let first = deposit(1, 10, &bob, 1);
        let second = deposit(2, 11, &bob, 2);

        bridge.submit_claim(vals[0].id, first.clone()).unwrap();
        bridge.submit_claim(vals[0].id, second.clone()).unwrap();

        // B corroborates nonce 2 before voting on nonce 1
        let status = bridge.submit_claim(vals[1].id, second).unwrap();
        assert_eq!(status, AttestationStatus::Pending { power: 67, required: 67 });
        assert_eq!(bridge.last_attested_nonce(), 0);

        assert_eq!(
            bridge.submit_claim(vals[1].id, first).unwrap(),
            AttestationStatus::Finalized
        );
        assert_eq!(bridge.last_attested_nonce(), 2);
        assert_eq!(bridge.ledger().balance(&bob, &TOKEN), U256::from(3u64));

        let finalized: Vec<u64> = bridge
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                BridgeEvent::EventFinalized { nonce, .. } => Some(nonce),
                _ => None,
            })
            .collect();
        assert_eq!(finalized, vec![1, 2]);
    }

    // =========================================================================
    // REJECTIONS
    // =========================================================================

    #[test]
    fn test_out_of_order_claims_rejected() {
        let vals = validators(&[34, 33, 33]);
        let mut bridge = bridge(config(), &vals, InMemoryDepositLedger::new());
        let bob = account("bob");

        assert!(matches!(
            bridge.submit_claim(vals[0].id, deposit(2, 10, &bob, 1)),
            Err(BridgeError::OutOfOrder { expected: 1, got: 2 })
        ));

        attest(&mut bridge, &[&vals[0], &vals[1]], &deposit(1, 10, &bob, 1)).unwrap();

        // A different event at a finalized nonce
        assert!(matches!(
            bridge.submit_claim(vals[2].id, deposit(1, 10, &bob, 9)),
            Err(BridgeError::OutOfOrder { expected: 2, got: 1 })
        ));
        assert_eq!(
            bridge.submit_claim(vals[2].id, deposit(1, 10, &bob, 1)).unwrap(),
            AttestationStatus::AlreadyFinalized
        );
        assert_eq!(bridge.ledger().balance(&bob, &TOKEN), U256::from(1u64));
    }

    #[test]
    fn test_nonce_zero_rejected() {
        let vals = validators(&[34, 33, 33]);
        let mut bridge = bridge(config(), &vals, InMemoryDepositLedger::new());
        let bob = account("bob");

        assert!(matches!(
            bridge.submit_claim(vals[0].id, deposit(0, 10, &bob, 5)),
            Err(BridgeError::InvalidEvent(_))
        ));
        assert!(bridge.attestor().is_empty());
    }

    #[test]
    fn test_unusable_payloads_do_not_stall_the_stream() {
        let vals = validators(&[34, 33, 33]);
        let mut bridge = bridge(config(), &vals, InMemoryDepositLedger::new());
        let bob = account("bob");
        let wide_token = ForeignEvent::new(
            2,
            11,
            EventKind::Erc20Deployed {
                token_contract: EthAddress([0xAB; 20]),
                denom: "uwide".into(),
                name: "Wide".into(),
                symbol: "WIDE".into(),
                decimals: 200,
            },
        );

        let all = [&vals[0], &vals[1], &vals[2]];
        let zero = attest(&mut bridge, &all, &deposit(1, 10, &bob, 0)).unwrap();
        assert_eq!(zero[1], AttestationStatus::Finalized);
        let wide = attest(&mut bridge, &all, &wide_token).unwrap();
        assert_eq!(wide[1], AttestationStatus::Finalized);
        attest(&mut bridge, &all, &deposit(3, 12, &bob, 4)).unwrap();

        assert_eq!(bridge.last_attested_nonce(), 3);
        assert!(bridge.erc20(&EthAddress([0xAB; 20])).is_none());
        assert_eq!(bridge.ledger().balance(&bob, &TOKEN), U256::from(4u64));
        let skipped = bridge
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, BridgeEvent::EventSkipped { .. }))
            .count();
        assert_eq!(skipped, 2);
    }

    #[test]
    fn test_equivocation_evidence_reaches_queries() {
        let vals = validators(&[34, 33, 33]);
        let mut bridge = bridge(config(), &vals, InMemoryDepositLedger::new());
        let bob = account("bob");

        bridge.submit_claim(vals[2].id, deposit(1, 10, &bob, 5)).unwrap();
        assert!(matches!(
            bridge.submit_claim(vals[2].id, deposit(1, 10, &bob, 6)),
            Err(BridgeError::Equivocation(_))
        ));

        let state = committed_state(InMemoryKVStore::new());
        bridge.commit(&state).unwrap();
        let evidence = BridgeQuery::new(state).equivocation_evidence().unwrap();
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].validator, vals[2].id);
    }

    // =========================================================================
    // REPLICAS AND READERS
    // =========================================================================

    #[test]
    fn test_replicas_converge_under_different_interleavings() {
        let vals = validators(&[34, 33, 33]);
        let bob = account("bob");
        let events = [deposit(1, 10, &bob, 5), deposit(2, 12, &bob, 7)];

        let (a, b) = (&vals[0], &vals[1]);

        let mut first = bridge(config(), &vals, InMemoryDepositLedger::new());
        for event in &events {
            attest(&mut first, &[a, b], event).unwrap();
        }

        // B runs ahead, A catches up and finalizes both
        let mut second = bridge(config(), &vals, InMemoryDepositLedger::new());
        for event in &events {
            attest(&mut second, &[b], event).unwrap();
        }
        for event in &events {
            attest(&mut second, &[a], event).unwrap();
        }

        let left = committed_state(InMemoryKVStore::new());
        let right = committed_state(InMemoryKVStore::new());
        first.commit(&left).unwrap();
        second.commit(&right).unwrap();

        assert_eq!(
            left.read().prefix_scan(&[]).unwrap(),
            right.read().prefix_scan(&[]).unwrap()
        );
        assert_eq!(first.ledger(), second.ledger());
    }

    #[test]
    fn test_readers_only_see_committed_steps() {
        let vals = validators(&[34, 33, 33]);
        let mut bridge = bridge(config(), &vals, InMemoryDepositLedger::new());
        let state = committed_state(InMemoryKVStore::new());
        let query = BridgeQuery::new(state.clone());

        bridge.commit(&state).unwrap();
        attest(&mut bridge, &[&vals[0], &vals[1]], &deposit(1, 10, &account("bob"), 5)).unwrap();
        assert_eq!(query.last_attested_nonce().unwrap(), 0);

        bridge.commit(&state).unwrap();
        assert_eq!(query.last_attested_nonce().unwrap(), 1);
        assert_eq!(query.active_valset().unwrap().unwrap().total_power(), 100);
    }
}
