//! `StockCore` - idempotent atomic stock reservation engine
//!
//! This library manages per-SKU stock levels and fulfills reservation
//! requests triggered by order events, guaranteeing that concurrent,
//! possibly-duplicated reservation attempts never oversell inventory and
//! never apply the same order's effect twice.
//!
//! The crate defines three ports ([`InventoryStore`], [`IdempotencyLedger`],
//! and [`OutcomeNotifier`]) and the [`ReservationOrchestrator`] that drives
//! them. Backends live in adapter crates (`stockcore-memory`,
//! `stockcore-postgres`); the core is backend-independent.
//!
//! # Guarantees
//!
//! - **No negative stock**: the store enforces `quantity >= 0` on every
//!   mutation.
//! - **All-or-nothing**: a multi-SKU reservation commits entirely or not at
//!   all; one short SKU rejects the whole batch.
//! - **Exactly-once effects under at-least-once delivery**: finalized orders
//!   are skipped entirely on redelivery, within the ledger retention window.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod availability;
pub mod demand;
pub mod errors;
pub mod ledger;
pub mod notifier;
pub mod orchestrator;
pub mod store;
pub mod types;

pub use availability::AvailabilityChecker;
pub use demand::{Demand, DemandSet, DemandSetError, ReservationRequest};
pub use errors::{
    LedgerError, LedgerResult, NotifierError, NotifierResult, ReservationError, StoreError,
    StoreResult,
};
pub use ledger::{IdempotencyLedger, IdempotencyRecord};
pub use notifier::{OutcomeNotifier, RejectionReason, ReservationOutcome};
pub use orchestrator::{OrchestratorConfig, ProcessOutcome, ReservationOrchestrator};
pub use store::{InventoryStore, StockRecord};
pub use types::{OrderId, Quantity, Sku, Timestamp};
