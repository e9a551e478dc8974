//! Property tests for idempotent finalization: replaying any mix of orders
//! after they reach terminal outcomes changes nothing.

use proptest::prelude::*;
use stockcore::{
    Demand, DemandSet, InventoryStore, OrderId, ProcessOutcome, Quantity,
    ReservationOrchestrator, ReservationRequest, Sku,
};
use stockcore_memory::{InMemoryIdempotencyLedger, InMemoryInventoryStore, InMemoryOutcomeNotifier};

fn sku(s: &str) -> Sku {
    Sku::try_new(s).expect("valid sku")
}

fn request(order_index: usize, lines: &[(usize, u64)]) -> ReservationRequest {
    let demands = DemandSet::new(lines.iter().map(|(i, q)| {
        Demand::new(
            sku(&format!("sku-{i}")),
            Quantity::try_new(*q).expect("positive quantity"),
        )
    }))
    .expect("non-empty demand set");
    ReservationRequest::new(
        OrderId::try_new(format!("order-{order_index}")).expect("valid order id"),
        demands,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Process a batch of random orders to terminal outcomes, then replay
    /// every order (in a different interleaving). The replays must all be
    /// no-ops: no quantity moves and no outcome is re-published.
    #[test]
    fn replays_after_finalization_change_nothing(
        stock in proptest::collection::vec(0u64..15, 4),
        orders in proptest::collection::vec(
            proptest::collection::vec((0usize..4, 1u64..5), 1..4),
            1..10
        )
    ) {
        let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
        rt.block_on(async {
            let store = InMemoryInventoryStore::new();
            for (i, quantity) in stock.iter().enumerate() {
                store
                    .create(&sku(&format!("sku-{i}")), *quantity)
                    .await
                    .expect("seed sku");
            }
            let ledger = InMemoryIdempotencyLedger::new();
            let notifier = InMemoryOutcomeNotifier::new();
            let orchestrator =
                ReservationOrchestrator::new(store.clone(), ledger, notifier.clone());

            let requests: Vec<ReservationRequest> = orders
                .iter()
                .enumerate()
                .map(|(index, lines)| request(index, lines))
                .collect();

            // First pass: every order reaches a terminal outcome.
            for req in &requests {
                let outcome = orchestrator.process(req).await.expect("no failures");
                prop_assert_ne!(outcome, ProcessOutcome::AlreadyFinalized);
            }

            let published_after_first_pass = notifier.publish_count();
            prop_assert_eq!(published_after_first_pass, requests.len());

            let mut quantities = Vec::new();
            for i in 0..stock.len() {
                let record = store
                    .get(&sku(&format!("sku-{i}")))
                    .await
                    .expect("store read")
                    .expect("seeded");
                quantities.push(record.quantity);
            }

            // Replay every order twice, back to front.
            for req in requests.iter().rev().chain(requests.iter()) {
                let outcome = orchestrator.process(req).await.expect("no failures");
                prop_assert_eq!(outcome, ProcessOutcome::AlreadyFinalized);
            }

            // No further store mutation and no further notification.
            for (i, expected) in quantities.iter().enumerate() {
                let record = store
                    .get(&sku(&format!("sku-{i}")))
                    .await
                    .expect("store read")
                    .expect("seeded");
                prop_assert_eq!(record.quantity, *expected);
            }
            prop_assert_eq!(notifier.publish_count(), published_after_first_pass);
            Ok(())
        })?;
    }
}
