//! Inventory store abstraction: the port that owns all stock mutation.
//!
//! This module defines the [`InventoryStore`] trait that serves as the port
//! interface for different storage backends. The trait is backend-independent;
//! implementations may realize `reserve_all` with compare-and-swap loops,
//! optimistic versioning, or native multi-key transactions, provided the
//! atomicity and isolation guarantees hold.

use crate::demand::DemandSet;
use crate::errors::StoreResult;
use crate::types::{Sku, Timestamp};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The per-SKU stock row.
///
/// `quantity >= 0` holds after every mutation; the store enforces it, the
/// caller never does. Records are created once at product-onboarding time and
/// never deleted by the reservation core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    /// The SKU this record tracks. Primary key.
    pub sku: Sku,
    /// Units currently on hand.
    pub quantity: u64,
    /// When the record was last mutated. Advisory only.
    pub updated_at: Timestamp,
}

impl StockRecord {
    /// Creates a record stamped with the current time.
    pub fn new(sku: Sku, quantity: u64) -> Self {
        Self {
            sku,
            quantity,
            updated_at: Timestamp::now(),
        }
    }

    /// Whether the record currently covers `quantity` units.
    pub const fn covers(&self, quantity: u64) -> bool {
        self.quantity >= quantity
    }
}

/// The inventory store port.
///
/// `StockRecord` rows are the only mutable shared state in the system and may
/// only be mutated through `adjust` or `reserve_all`. Callers must not cache
/// quantities across reservation decisions: every `reserve_all` reads current
/// authoritative state as part of its atomic check.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Reads the stock record for a SKU.
    ///
    /// A missing key is a normal `None`, never an error.
    async fn get(&self, sku: &Sku) -> StoreResult<Option<StockRecord>>;

    /// Initializes a stock record. Zero is a legal starting quantity; the
    /// catalog/onboarding collaborator creates zero-stock records when a
    /// product is introduced.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::AlreadyExists`] if the SKU already has a
    /// record.
    async fn create(&self, sku: &Sku, quantity: u64) -> StoreResult<StockRecord>;

    /// Unconditionally adds `delta` (positive or negative) to a single SKU's
    /// quantity. Used for non-reservation adjustments; not atomic across
    /// multiple SKUs.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::SkuNotFound`] for a missing record and
    /// [`crate::StoreError::StockUnderflow`] if the result would be negative.
    async fn adjust(&self, sku: &Sku, delta: i64) -> StoreResult<StockRecord>;

    /// Atomically decrements every demanded SKU, iff every SKU's current
    /// quantity covers its demand.
    ///
    /// Either all decrements apply or none do; no partial application is
    /// observable by any other reader. Two concurrent calls contending for a
    /// SKU with exactly enough stock for one of them resolve so that exactly
    /// one returns `true` and the other observes `false`.
    ///
    /// Returns `Ok(false)` (a normal negative result, not an error) when
    /// any single SKU is short or absent; insufficiency of one SKU rejects
    /// the entire batch.
    ///
    /// # Errors
    ///
    /// Only transient infrastructure failures ([`crate::StoreError::Unavailable`],
    /// [`crate::StoreError::Timeout`]); the caller retries the whole
    /// orchestrator step.
    async fn reserve_all(&self, demands: &DemandSet) -> StoreResult<bool>;
}
