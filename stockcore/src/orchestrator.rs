//! The reservation orchestrator: the state machine at the heart of the
//! system.
//!
//! Per order id the conceptual states are `Unseen -> (Deciding) -> Finalized`.
//! "Deciding" is never persisted; it exists only as the in-flight execution of
//! one processing attempt. The orchestrator is invoked concurrently, once per
//! inbound order message, by any number of parallel workers, and tolerates a
//! delivery mechanism that redelivers the same order an unbounded number of
//! times.
//!
//! # Duplicate-delivery race
//!
//! Two workers processing the same order concurrently can both pass the
//! ledger check before either marks finalized (classic check-then-act). The
//! design accepts this: `reserve_all`'s per-key atomicity still prevents
//! oversold stock, but the notifier may fire more than once for that order.
//! Notification is therefore at-least-once, not exactly-once.

use crate::demand::ReservationRequest;
use crate::errors::{ReservationError, StoreError};
use crate::ledger::IdempotencyLedger;
use crate::notifier::{OutcomeNotifier, RejectionReason, ReservationOutcome};
use crate::store::InventoryStore;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Configuration for the reservation orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// How long finalization records are retained in the ledger. Correctness
    /// assumes redelivery stops before this window elapses.
    pub retention: Duration,
    /// Bound on the store's `reserve_all`; on elapse the attempt is treated
    /// as store-unavailable and nothing is finalized.
    pub store_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            retention: Duration::from_secs(3600),
            store_timeout: Duration::from_secs(10),
        }
    }
}

impl OrchestratorConfig {
    /// Sets the ledger retention window.
    #[must_use]
    pub const fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Sets the bound on store reservation calls.
    #[must_use]
    pub const fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }
}

/// What one processing attempt decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The ledger already held a live record for the order: nothing was
    /// read from the store, nothing published. The outcome was delivered on
    /// an earlier attempt.
    AlreadyFinalized,
    /// The demand set was reserved atomically and the order finalized.
    Reserved,
    /// The demand set was rejected and the order finalized; a rejected order
    /// can never succeed by retrying, so redelivery must not loop on it.
    Rejected(RejectionReason),
}

/// Orchestrates one reservation attempt across the three ports.
///
/// Dependencies are injected at construction time; there is no ambient
/// global state. The orchestrator holds no lock across its awaits; the
/// store's `reserve_all` is the only serialization point.
///
/// # Example
///
/// ```rust,ignore
/// let orchestrator = ReservationOrchestrator::new(store, ledger, notifier)
///     .with_config(OrchestratorConfig::default().with_retention(Duration::from_secs(900)));
///
/// let outcome = orchestrator.process(&request).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ReservationOrchestrator<S, L, N> {
    store: S,
    ledger: L,
    notifier: N,
    config: OrchestratorConfig,
}

impl<S, L, N> ReservationOrchestrator<S, L, N>
where
    S: InventoryStore,
    L: IdempotencyLedger,
    N: OutcomeNotifier,
{
    /// Creates an orchestrator with default configuration.
    pub fn new(store: S, ledger: L, notifier: N) -> Self {
        Self {
            store,
            ledger,
            notifier,
            config: OrchestratorConfig::default(),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Processes one delivery of a reservation request.
    ///
    /// The sequence is: ledger check, atomic store reservation, outcome
    /// publication, finalization. An infrastructure failure at any step
    /// returns an error *before* finalization, so the delivery layer can
    /// redeliver the order and the next attempt repeats safely from the
    /// ledger check.
    ///
    /// # Errors
    ///
    /// [`ReservationError`] for transient store, ledger, or notifier
    /// failures. The order is never finalized on the error path.
    #[instrument(
        skip(self, request),
        fields(order_id = %request.order_id(), demand_count = request.demands().len())
    )]
    pub async fn process(
        &self,
        request: &ReservationRequest,
    ) -> Result<ProcessOutcome, ReservationError> {
        let order_id = request.order_id();

        if self.ledger.is_finalized(order_id).await? {
            debug!(order_id = %order_id, "order already finalized, skipping");
            return Ok(ProcessOutcome::AlreadyFinalized);
        }

        let committed = match tokio::time::timeout(
            self.config.store_timeout,
            self.store.reserve_all(request.demands()),
        )
        .await
        {
            Ok(result) => result?,
            Err(_elapsed) => {
                // A timed-out reservation must never be assumed to have
                // partially committed.
                warn!(order_id = %order_id, timeout = ?self.config.store_timeout, "reservation timed out");
                return Err(ReservationError::Store(StoreError::Timeout(
                    self.config.store_timeout,
                )));
            }
        };

        let (outcome, decision) = if committed {
            (
                ReservationOutcome::reserved(order_id.clone()),
                ProcessOutcome::Reserved,
            )
        } else {
            (
                ReservationOutcome::rejected(order_id.clone(), RejectionReason::InsufficientStock),
                ProcessOutcome::Rejected(RejectionReason::InsufficientStock),
            )
        };

        self.notifier.publish(&outcome).await?;

        // Finalize last: if anything above failed, redelivery finds the order
        // unseen and repeats the attempt. Rejections finalize too, so an
        // order that structurally cannot succeed does not loop forever.
        self.ledger
            .mark_finalized(order_id, self.config.retention)
            .await?;

        match &decision {
            ProcessOutcome::Reserved => info!(order_id = %order_id, "reservation committed"),
            ProcessOutcome::Rejected(reason) => {
                info!(order_id = %order_id, %reason, "reservation rejected");
            }
            ProcessOutcome::AlreadyFinalized => {}
        }

        Ok(decision)
    }

    /// The configuration in effect.
    pub const fn config(&self) -> &OrchestratorConfig {
        &self.config
    }
}
