//! End-to-end reservation flow against the in-memory adapters, including a
//! redelivered order and a rejection.
//!
//! Run with: `cargo run --example reservation_flow`

use std::time::Duration;

use stockcore::{
    AvailabilityChecker, Demand, DemandSet, InventoryStore, OrchestratorConfig, OrderId, Quantity,
    ReservationOrchestrator, ReservationRequest, Sku,
};
use stockcore_memory::{InMemoryIdempotencyLedger, InMemoryInventoryStore, InMemoryOutcomeNotifier};

fn sku(s: &str) -> Sku {
    Sku::try_new(s).expect("valid sku")
}

fn demands(lines: &[(&str, u64)]) -> DemandSet {
    DemandSet::new(lines.iter().map(|(s, q)| {
        Demand::new(sku(s), Quantity::try_new(*q).expect("positive quantity"))
    }))
    .expect("non-empty demand set")
}

fn request(order: &str, lines: &[(&str, u64)]) -> ReservationRequest {
    ReservationRequest::new(
        OrderId::try_new(order).expect("valid order id"),
        demands(lines),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let store = InMemoryInventoryStore::new();
    let ledger = InMemoryIdempotencyLedger::new();
    let notifier = InMemoryOutcomeNotifier::new();

    // Product onboarding happens elsewhere; seed a small catalog here.
    store.create(&sku("widget"), 5).await?;
    store.create(&sku("gadget"), 1).await?;

    let orchestrator =
        ReservationOrchestrator::new(store.clone(), ledger.clone(), notifier.clone()).with_config(
            OrchestratorConfig::default().with_retention(Duration::from_secs(900)),
        );

    // A pre-checkout advisory read
    let checker = AvailabilityChecker::new(store.clone());
    let availability = checker
        .check(&demands(&[("widget", 3), ("gadget", 2)]))
        .await?;
    println!("availability: {availability:?}");

    // First delivery of order-1 commits
    let outcome = orchestrator
        .process(&request("order-1", &[("widget", 3), ("gadget", 1)]))
        .await?;
    println!("order-1 first delivery: {outcome:?}");

    // The delivery layer redelivers order-1; the ledger makes it a no-op
    let outcome = orchestrator
        .process(&request("order-1", &[("widget", 3), ("gadget", 1)]))
        .await?;
    println!("order-1 redelivery: {outcome:?}");

    // order-2 asks for more gadgets than remain and is rejected atomically
    let outcome = orchestrator
        .process(&request("order-2", &[("widget", 1), ("gadget", 1)]))
        .await?;
    println!("order-2: {outcome:?}");

    println!(
        "widget on hand: {}",
        store.get(&sku("widget")).await?.expect("seeded").quantity
    );
    println!("published outcomes: {}", notifier.publish_count());

    Ok(())
}
