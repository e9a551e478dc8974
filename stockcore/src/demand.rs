//! Reservation demands: the list of (SKU, quantity) lines an order requires.
//!
//! A [`DemandSet`] is the validated, normalized form of an order's demand
//! list. Construction enforces the inbound-request contract (non-empty list,
//! positive quantities via [`Quantity`]) so downstream code never re-checks
//! it, and normalizes the entries so adapters can rely on a deterministic
//! shape.

use crate::types::{OrderId, Quantity, Sku};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// A single demand line: one SKU and the quantity required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demand {
    /// The demanded SKU.
    pub sku: Sku,
    /// How many units of the SKU the order requires.
    pub quantity: Quantity,
}

impl Demand {
    /// Creates a new demand line.
    pub const fn new(sku: Sku, quantity: Quantity) -> Self {
        Self { sku, quantity }
    }
}

/// Errors from constructing a [`DemandSet`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DemandSetError {
    /// The demand list was empty, which the inbound request surface promises
    /// never to deliver.
    #[error("demand set must contain at least one demand")]
    Empty,

    /// Merging duplicate lines for the same SKU overflowed the quantity.
    #[error("merged quantity for '{sku}' overflows")]
    QuantityOverflow {
        /// The SKU whose merged quantity overflowed.
        sku: Sku,
    },
}

/// A non-empty, normalized set of demands.
///
/// Duplicate lines for the same SKU are merged by summing their quantities,
/// so each SKU appears exactly once. Entries are held in ascending SKU order;
/// adapters that take per-key locks acquire them in iteration order, which
/// makes the lock-acquisition order a deterministic total order and rules out
/// deadlock between concurrent reservations sharing SKUs.
///
/// Deserialization goes through [`DemandSet::new`], so a wire payload cannot
/// smuggle in an empty or unnormalized set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Demand>", into = "Vec<Demand>")]
pub struct DemandSet {
    demands: Vec<Demand>,
}

impl DemandSet {
    /// Builds a demand set from raw demand lines.
    ///
    /// # Errors
    ///
    /// Returns [`DemandSetError::Empty`] for an empty list and
    /// [`DemandSetError::QuantityOverflow`] if merged duplicate lines exceed
    /// `u64::MAX`.
    pub fn new(demands: impl IntoIterator<Item = Demand>) -> Result<Self, DemandSetError> {
        let mut merged: BTreeMap<Sku, u64> = BTreeMap::new();

        for demand in demands {
            let total = merged.entry(demand.sku.clone()).or_insert(0);
            *total = total
                .checked_add(demand.quantity.into_inner())
                .ok_or(DemandSetError::QuantityOverflow { sku: demand.sku })?;
        }

        if merged.is_empty() {
            return Err(DemandSetError::Empty);
        }

        let demands = merged
            .into_iter()
            .map(|(sku, quantity)| Demand {
                sku,
                // Sums of positive quantities stay positive once checked_add succeeds.
                quantity: Quantity::try_new(quantity).expect("merged quantity is positive"),
            })
            .collect();

        Ok(Self { demands })
    }

    /// Iterates the demands in ascending SKU order.
    pub fn iter(&self) -> impl Iterator<Item = &Demand> + '_ {
        self.demands.iter()
    }

    /// Number of distinct SKUs demanded.
    pub fn len(&self) -> usize {
        self.demands.len()
    }

    /// Always `false`: a demand set is non-empty by construction.
    pub fn is_empty(&self) -> bool {
        self.demands.is_empty()
    }

    /// Looks up the demanded quantity for a SKU, if present.
    pub fn quantity_for(&self, sku: &Sku) -> Option<Quantity> {
        self.demands
            .iter()
            .find(|demand| &demand.sku == sku)
            .map(|demand| demand.quantity)
    }
}

impl TryFrom<Vec<Demand>> for DemandSet {
    type Error = DemandSetError;

    fn try_from(demands: Vec<Demand>) -> Result<Self, Self::Error> {
        Self::new(demands)
    }
}

impl From<DemandSet> for Vec<Demand> {
    fn from(set: DemandSet) -> Self {
        set.demands
    }
}

impl<'a> IntoIterator for &'a DemandSet {
    type Item = &'a Demand;
    type IntoIter = std::slice::Iter<'a, Demand>;

    fn into_iter(self) -> Self::IntoIter {
        self.demands.iter()
    }
}

/// A parsed, already-validated inbound reservation request.
///
/// The request framing and validation layer delivers these; validity is
/// enforced by the smart constructors of the component types, so an instance
/// cannot violate the inbound contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRequest {
    order_id: OrderId,
    demands: DemandSet,
}

impl ReservationRequest {
    /// Creates a reservation request for the given order and demands.
    pub const fn new(order_id: OrderId, demands: DemandSet) -> Self {
        Self { order_id, demands }
    }

    /// The order identifier, used as the idempotency key.
    pub const fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    /// The demand set this order requires.
    pub const fn demands(&self) -> &DemandSet {
        &self.demands
    }
}
