//! Reservation outcomes and the notifier port that publishes them.
//!
//! Outcomes are a closed tagged variant with exactly two cases, not an
//! open-ended record. Delivery downstream is at-least-once: the documented
//! check-then-act window in the orchestrator means a duplicated order can,
//! rarely, publish its outcome twice.

use crate::errors::NotifierResult;
use crate::types::OrderId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Why a reservation was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    /// At least one demanded SKU had less stock than required, so the whole
    /// batch was rejected. Terminal: retrying cannot succeed until stock is
    /// adjusted, so the order is finalized anyway.
    InsufficientStock,
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientStock => f.write_str("insufficient stock"),
        }
    }
}

/// The terminal outcome of one order's reservation, emitted via the notifier.
///
/// Serializes as `{"type": "Reserved", "orderId": ...}` or
/// `{"type": "Rejected", "orderId": ..., "reason": "InsufficientStock"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ReservationOutcome {
    /// Every demand line was decremented atomically.
    Reserved {
        /// The order whose demands were reserved.
        #[serde(rename = "orderId")]
        order_id: OrderId,
    },
    /// The demand set was rejected as a whole; no stock changed.
    Rejected {
        /// The order whose demands were rejected.
        #[serde(rename = "orderId")]
        order_id: OrderId,
        /// The business reason for rejection.
        reason: RejectionReason,
    },
}

impl ReservationOutcome {
    /// A successful reservation outcome for `order_id`.
    pub const fn reserved(order_id: OrderId) -> Self {
        Self::Reserved { order_id }
    }

    /// A rejection outcome for `order_id`.
    pub const fn rejected(order_id: OrderId, reason: RejectionReason) -> Self {
        Self::Rejected { order_id, reason }
    }

    /// The order this outcome belongs to.
    pub const fn order_id(&self) -> &OrderId {
        match self {
            Self::Reserved { order_id } | Self::Rejected { order_id, .. } => order_id,
        }
    }
}

/// The outcome notifier port: a one-way, fire-and-forget channel.
///
/// The core does not wait for downstream acknowledgment beyond local send
/// confirmation. A send failure must surface as an error so the orchestrator
/// skips finalization and the delivery layer retries the order.
#[async_trait]
pub trait OutcomeNotifier: Send + Sync {
    /// Publishes an outcome to downstream consumers.
    async fn publish(&self, outcome: &ReservationOutcome) -> NotifierResult<()>;
}
