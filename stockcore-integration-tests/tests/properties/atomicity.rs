//! Property tests for `reserve_all` atomicity.
//!
//! These verify the all-or-nothing contract over arbitrary stock levels and
//! demand sets: a rejected batch changes no quantity at all, and a committed
//! batch decrements every line by exactly its demand.

use proptest::prelude::*;
use std::collections::HashMap;
use stockcore::{Demand, DemandSet, InventoryStore, Quantity, Sku};
use stockcore_memory::InMemoryInventoryStore;

/// A generated inventory fixture: stock levels and a demand set over an
/// overlapping set of SKUs.
#[derive(Debug, Clone)]
struct Fixture {
    stock: Vec<(String, u64)>,
    demands: Vec<(String, u64)>,
}

fn fixture() -> impl Strategy<Value = Fixture> {
    // Up to 8 SKUs with stock, demands drawn from a superset so some demands
    // may target absent SKUs.
    (1usize..8).prop_flat_map(|sku_count| {
        let stock = proptest::collection::vec(0u64..20, sku_count);
        let demands = proptest::collection::vec((0usize..sku_count + 2, 1u64..10), 1..6);
        (stock, demands).prop_map(|(stock, demands)| Fixture {
            stock: stock
                .into_iter()
                .enumerate()
                .map(|(i, q)| (format!("sku-{i}"), q))
                .collect(),
            demands: demands
                .into_iter()
                .map(|(i, q)| (format!("sku-{i}"), q))
                .collect(),
        })
    })
}

fn sku(s: &str) -> Sku {
    Sku::try_new(s).expect("valid sku")
}

fn demand_set(lines: &[(String, u64)]) -> DemandSet {
    DemandSet::new(lines.iter().map(|(s, q)| {
        Demand::new(sku(s), Quantity::try_new(*q).expect("positive quantity"))
    }))
    .expect("non-empty demand set")
}

async fn seed(fixture: &Fixture) -> InMemoryInventoryStore {
    let store = InMemoryInventoryStore::new();
    for (s, q) in &fixture.stock {
        store.create(&sku(s), *q).await.expect("seed sku");
    }
    store
}

async fn snapshot(store: &InMemoryInventoryStore, fixture: &Fixture) -> HashMap<String, u64> {
    let mut quantities = HashMap::new();
    for (s, _) in &fixture.stock {
        let record = store.get(&sku(s)).await.expect("store read").expect("seeded");
        quantities.insert(s.clone(), record.quantity);
    }
    quantities
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// After any `reserve_all`, either every demanded quantity was deducted
    /// (commit) or every quantity is untouched (reject). Nothing in between.
    #[test]
    fn reserve_all_is_all_or_nothing(fixture in fixture()) {
        let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
        rt.block_on(async {
            let store = seed(&fixture).await;
            let before = snapshot(&store, &fixture).await;
            let demands = demand_set(&fixture.demands);

            let committed = store.reserve_all(&demands).await.expect("store available");
            let after = snapshot(&store, &fixture).await;

            if committed {
                for demand in &demands {
                    let name = demand.sku.as_ref();
                    // A demand on an absent SKU cannot have committed.
                    let before_q = before.get(name).copied().expect("committed SKU existed");
                    let after_q = after.get(name).copied().expect("committed SKU existed");
                    prop_assert_eq!(after_q, before_q - demand.quantity.into_inner());
                }
                // SKUs outside the demand set are untouched.
                for (name, before_q) in &before {
                    if demands.quantity_for(&sku(name)).is_none() {
                        prop_assert_eq!(after.get(name), Some(before_q));
                    }
                }
            } else {
                // A rejected batch leaves every quantity exactly as it was.
                prop_assert_eq!(&before, &after);
            }
            Ok(())
        })?;
    }

    /// `reserve_all` commits exactly when every demanded SKU covers its
    /// merged demand.
    #[test]
    fn commit_decision_matches_coverage(fixture in fixture()) {
        let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
        rt.block_on(async {
            let store = seed(&fixture).await;
            let before = snapshot(&store, &fixture).await;
            let demands = demand_set(&fixture.demands);

            let expected = demands.iter().all(|demand| {
                before
                    .get(demand.sku.as_ref())
                    .is_some_and(|q| *q >= demand.quantity.into_inner())
            });

            let committed = store.reserve_all(&demands).await.expect("store available");
            prop_assert_eq!(committed, expected);
            Ok(())
        })?;
    }
}
