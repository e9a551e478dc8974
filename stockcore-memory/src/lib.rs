//! In-memory adapters for the `StockCore` reservation engine
//!
//! This crate provides in-memory implementations of the `InventoryStore`,
//! `IdempotencyLedger`, and `OutcomeNotifier` ports from the stockcore
//! crate, useful for testing and development scenarios where persistence is
//! not required.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use stockcore::errors::{LedgerResult, NotifierResult, StoreError, StoreResult};
use stockcore::ledger::{IdempotencyLedger, IdempotencyRecord};
use stockcore::notifier::{OutcomeNotifier, ReservationOutcome};
use stockcore::store::{InventoryStore, StockRecord};
use stockcore::types::{OrderId, Sku, Timestamp};
use stockcore::DemandSet;
use tracing::debug;

/// Thread-safe in-memory inventory store for testing.
///
/// `reserve_all` holds the single write lock across its check-and-decrement,
/// which is what gives the conditional multi-key decrement its serializable
/// isolation: no other reader or writer can observe a partial application.
#[derive(Debug, Clone)]
pub struct InMemoryInventoryStore {
    records: Arc<RwLock<HashMap<Sku, StockRecord>>>,
}

impl InMemoryInventoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryInventoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn get(&self, sku: &Sku) -> StoreResult<Option<StockRecord>> {
        let records = self.records.read().expect("RwLock poisoned");

        Ok(records.get(sku).cloned())
    }

    async fn create(&self, sku: &Sku, quantity: u64) -> StoreResult<StockRecord> {
        let mut records = self.records.write().expect("RwLock poisoned");

        if records.contains_key(sku) {
            return Err(StoreError::AlreadyExists(sku.clone()));
        }

        let record = StockRecord::new(sku.clone(), quantity);
        records.insert(sku.clone(), record.clone());
        Ok(record)
    }

    async fn adjust(&self, sku: &Sku, delta: i64) -> StoreResult<StockRecord> {
        let mut records = self.records.write().expect("RwLock poisoned");

        let record = records
            .get_mut(sku)
            .ok_or_else(|| StoreError::SkuNotFound(sku.clone()))?;

        let adjusted = if delta >= 0 {
            record.quantity.checked_add(delta.unsigned_abs())
        } else {
            record.quantity.checked_sub(delta.unsigned_abs())
        };

        match adjusted {
            Some(quantity) => {
                record.quantity = quantity;
                record.updated_at = Timestamp::now();
                Ok(record.clone())
            }
            None => Err(StoreError::StockUnderflow {
                sku: sku.clone(),
                current: record.quantity,
                delta,
            }),
        }
    }

    async fn reserve_all(&self, demands: &DemandSet) -> StoreResult<bool> {
        let mut records = self.records.write().expect("RwLock poisoned");

        // First, verify every demand is covered by current stock
        for demand in demands {
            let covered = records
                .get(&demand.sku)
                .is_some_and(|record| record.covers(demand.quantity.into_inner()));

            if !covered {
                debug!(sku = %demand.sku, "insufficient stock, rejecting whole batch");
                return Ok(false);
            }
        }

        // All demands covered, apply every decrement under the same lock
        for demand in demands {
            let record = records
                .get_mut(&demand.sku)
                .expect("presence verified above");
            record.quantity -= demand.quantity.into_inner();
            record.updated_at = Timestamp::now();
        }

        Ok(true)
    }
}

/// Thread-safe in-memory idempotency ledger for testing.
///
/// Expiry is wall-clock based; expired entries are dropped lazily when read.
#[derive(Debug, Clone)]
pub struct InMemoryIdempotencyLedger {
    records: Arc<RwLock<HashMap<OrderId, IdempotencyRecord>>>,
}

impl InMemoryIdempotencyLedger {
    /// Creates a new empty in-memory ledger.
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of live (unexpired) entries. Test helper.
    pub fn live_entries(&self) -> usize {
        let records = self.records.read().expect("RwLock poisoned");
        records.values().filter(|r| r.is_live()).count()
    }
}

impl Default for InMemoryIdempotencyLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdempotencyLedger for InMemoryIdempotencyLedger {
    async fn is_finalized(&self, order_id: &OrderId) -> LedgerResult<bool> {
        let mut records = self.records.write().expect("RwLock poisoned");

        match records.get(order_id) {
            Some(record) if record.is_live() => Ok(true),
            Some(_) => {
                // Lazy garbage collection of the expired entry
                records.remove(order_id);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn mark_finalized(&self, order_id: &OrderId, retention: Duration) -> LedgerResult<()> {
        let mut records = self.records.write().expect("RwLock poisoned");

        // A live entry is never mutated; an expired one is re-armed.
        let live = records.get(order_id).is_some_and(IdempotencyRecord::is_live);
        if !live {
            records.insert(
                order_id.clone(),
                IdempotencyRecord::new(order_id.clone(), retention),
            );
        }

        Ok(())
    }
}

/// Outcome notifier that records every published outcome for inspection.
#[derive(Debug, Clone)]
pub struct InMemoryOutcomeNotifier {
    published: Arc<RwLock<Vec<ReservationOutcome>>>,
}

impl InMemoryOutcomeNotifier {
    /// Creates a new notifier with an empty publication log.
    pub fn new() -> Self {
        Self {
            published: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Every outcome published so far, in publication order.
    pub fn published(&self) -> Vec<ReservationOutcome> {
        self.published.read().expect("RwLock poisoned").clone()
    }

    /// Number of publications so far.
    pub fn publish_count(&self) -> usize {
        self.published.read().expect("RwLock poisoned").len()
    }
}

impl Default for InMemoryOutcomeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutcomeNotifier for InMemoryOutcomeNotifier {
    async fn publish(&self, outcome: &ReservationOutcome) -> NotifierResult<()> {
        let mut published = self.published.write().expect("RwLock poisoned");
        published.push(outcome.clone());
        Ok(())
    }
}
