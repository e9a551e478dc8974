//! Error types for `StockCore`.
//!
//! The error design separates three kinds of failure into types:
//!
//! - **Transient infrastructure failure** ([`StoreError`], [`LedgerError`],
//!   [`NotifierError`]): propagated to the delivery layer, which retries the
//!   whole order. Nothing is finalized first, so retries are safe.
//! - **Business rejection** (insufficient stock): NOT an error. It is a
//!   normal negative result: `reserve_all` returns `Ok(false)` and the
//!   orchestrator emits a `Rejected` outcome.
//! - **Contract violation** (empty demand list, blank identifiers): made
//!   unrepresentable by the smart constructors in [`crate::types`] and
//!   [`crate::demand`], so it surfaces at parse time in the inbound layer,
//!   never here.

use crate::types::Sku;
use std::time::Duration;
use thiserror::Error;

/// Result type for inventory store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for idempotency ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Result type for outcome notifier operations.
pub type NotifierResult<T> = Result<T, NotifierError>;

/// Errors surfaced by an [`crate::store::InventoryStore`] implementation.
///
/// Insufficient stock is deliberately absent: `reserve_all` reports it as a
/// normal `false`, never as an error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// `create` was called for a SKU that already has a stock record.
    #[error("stock record for '{0}' already exists")]
    AlreadyExists(Sku),

    /// A single-key mutation targeted a SKU with no stock record.
    #[error("stock record for '{0}' not found")]
    SkuNotFound(Sku),

    /// An adjustment would drive a quantity below zero. The store, not the
    /// caller, enforces the non-negativity invariant.
    #[error("adjusting '{sku}' by {delta} would drive quantity below zero (current {current})")]
    StockUnderflow {
        /// The SKU whose adjustment was refused.
        sku: Sku,
        /// The quantity on record at refusal time.
        current: u64,
        /// The requested delta.
        delta: i64,
    },

    /// The operation exceeded its bounded timeout. Must be treated exactly
    /// like [`StoreError::Unavailable`]: never assume a partial commit.
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    /// The store is temporarily unreachable; the caller should retry the
    /// whole orchestrator step later.
    #[error("inventory store unavailable: {0}")]
    Unavailable(String),

    /// An adapter-level invariant broke (for example, a stored quantity that
    /// does not fit the domain type). Indicates a bug or corrupt storage.
    #[error("internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Whether a retry of the whole orchestrator step may succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Unavailable(_))
    }
}

/// Errors surfaced by an [`crate::ledger::IdempotencyLedger`] implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The ledger is temporarily unreachable.
    #[error("idempotency ledger unavailable: {0}")]
    Unavailable(String),

    /// The operation exceeded its bounded timeout.
    #[error("ledger operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors surfaced by an [`crate::notifier::OutcomeNotifier`] implementation.
///
/// A send failure prevents finalization, so the delivery layer retries the
/// order and the outcome is eventually published at least once.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotifierError {
    /// The outcome could not be handed to the downstream channel.
    #[error("outcome publish failed: {0}")]
    SendFailed(String),
}

/// Errors from one orchestrator processing attempt.
///
/// Every variant wraps a transient infrastructure failure; all are safe to
/// retry via redelivery because the orchestrator finalizes nothing before
/// returning an error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReservationError {
    /// The inventory store failed before a decision was reached.
    #[error("inventory store error: {0}")]
    Store(#[from] StoreError),

    /// The idempotency ledger failed.
    #[error("idempotency ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The outcome notifier failed; the order is left unfinalized so the
    /// outcome is re-published on retry.
    #[error("outcome notifier error: {0}")]
    Notifier(#[from] NotifierError),
}
