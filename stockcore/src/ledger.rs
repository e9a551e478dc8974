//! Idempotency ledger: remembers which orders have already been finalized.
//!
//! The ledger is what turns at-least-once inbound delivery into exactly-once
//! reservation effects. Entries are retention-bounded: after `expires_at` the
//! storage layer may forget them. That is a scoping assumption, not a bug:
//! correctness depends on redelivery never occurring after the entry expires.
//! If the upstream delivery system can redeliver arbitrarily late, a
//! duplicate reservation could theoretically recur.

use crate::errors::LedgerResult;
use crate::types::{OrderId, Timestamp};
use async_trait::async_trait;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One finalized order, written exactly once when the order reaches a
/// terminal outcome (success or definitive business rejection), never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    /// The finalized order.
    pub order_id: OrderId,
    /// After this instant the record may silently disappear.
    pub expires_at: Timestamp,
    /// When the record was written. Advisory only.
    pub recorded_at: Timestamp,
}

impl IdempotencyRecord {
    /// Creates a record expiring `retention` from now.
    pub fn new(order_id: OrderId, retention: Duration) -> Self {
        let now = Timestamp::now();
        let retention = TimeDelta::from_std(retention).unwrap_or(TimeDelta::MAX);
        Self {
            order_id,
            expires_at: Timestamp::new(
                now.as_datetime()
                    .checked_add_signed(retention)
                    .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC),
            ),
            recorded_at: now,
        }
    }

    /// Whether the record is still within its retention window.
    pub fn is_live(&self) -> bool {
        self.expires_at > Timestamp::now()
    }
}

/// The idempotency ledger port.
///
/// Writes are expected to become visible to subsequent reads from any caller;
/// the design requires redelivery windows to be short relative to the
/// retention duration, not strict read-after-write across replicas.
#[async_trait]
pub trait IdempotencyLedger: Send + Sync {
    /// Whether the order has already reached a terminal outcome. Expired
    /// entries read as `false`.
    async fn is_finalized(&self, order_id: &OrderId) -> LedgerResult<bool>;

    /// Records the order as finalized for at least `retention`.
    ///
    /// Idempotent: re-marking an order whose entry is still live is a no-op;
    /// an expired entry is re-armed.
    async fn mark_finalized(&self, order_id: &OrderId, retention: Duration) -> LedgerResult<()>;
}
