//! Advisory availability checks: read-only, per-SKU, no reservation effect.

use crate::demand::DemandSet;
use crate::errors::StoreResult;
use crate::store::InventoryStore;
use crate::types::Sku;
use std::collections::HashMap;
use tracing::instrument;

/// Answers whether current stock covers a demand set, without mutating
/// anything.
///
/// Each SKU is read independently, so the answer is a point-in-time snapshot
/// with no atomicity across SKUs. It exists purely as a pre-checkout
/// advisory and must never be used as a substitute for
/// [`InventoryStore::reserve_all`]'s guarantee: stock that reads as available
/// here can be gone by the time the order arrives.
#[derive(Debug, Clone)]
pub struct AvailabilityChecker<S> {
    store: S,
}

impl<S> AvailabilityChecker<S>
where
    S: InventoryStore,
{
    /// Creates a checker over the given store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Reports, per demanded SKU, whether current stock covers the demand.
    /// An absent SKU is reported unavailable.
    #[instrument(skip(self, demands), fields(demand_count = demands.len()))]
    pub async fn check(&self, demands: &DemandSet) -> StoreResult<HashMap<Sku, bool>> {
        let mut availability = HashMap::with_capacity(demands.len());

        for demand in demands {
            let available = self
                .store
                .get(&demand.sku)
                .await?
                .is_some_and(|record| record.covers(demand.quantity.into_inner()));
            availability.insert(demand.sku.clone(), available);
        }

        Ok(availability)
    }
}
