//! Core identifier and value types for the `StockCore` reservation engine.
//!
//! All types use smart constructors to ensure validity at construction time,
//! following the "parse, don't validate" principle: once a value exists, no
//! further validation is needed anywhere downstream.

use chrono::{DateTime, Utc};
use nutype::nutype;
use serde::{Deserialize, Serialize};

/// A stock-keeping unit identifier for a sellable item.
///
/// `Sku` values are guaranteed to be non-empty (after trimming) and at most
/// 128 characters. A constructed `Sku` is always a valid store key.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 128),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct Sku(String);

/// An order identifier, the idempotency key for reservation processing.
///
/// `OrderId` values are guaranteed to be non-empty (after trimming) and at
/// most 128 characters. The inbound delivery layer is responsible for
/// producing these; an order may be delivered more than once with the same id.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 128),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        AsRef,
        Deref,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct OrderId(String);

/// A demanded quantity within a reservation request.
///
/// Demand quantities are strictly positive; a zero-quantity demand line is a
/// contract violation of the inbound request surface and is unrepresentable.
/// Stock levels themselves are plain `u64` values on [`crate::StockRecord`],
/// where zero is legal.
#[nutype(
    validate(greater = 0),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Display,
        Into,
        Serialize,
        Deserialize
    )
)]
pub struct Quantity(u64);

/// A timestamp recording when a record was last touched.
///
/// Advisory only: no correctness property depends on these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a new timestamp from a UTC `DateTime`.
    pub const fn new(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }

    /// Creates a timestamp representing the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Returns the underlying `DateTime`.
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Converts the timestamp into the underlying `DateTime`.
    pub const fn into_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self::new(datetime)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(timestamp: Timestamp) -> Self {
        timestamp.into_datetime()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn sku_accepts_valid_strings(s in "[a-zA-Z0-9_-]{1,128}") {
            let result = Sku::try_new(s.clone());
            prop_assert!(result.is_ok());
            let sku = result.unwrap();
            prop_assert_eq!(sku.as_ref(), &s);
        }

        #[test]
        fn sku_trims_whitespace(s in " {0,8}[a-zA-Z0-9_-]{1,100} {0,8}") {
            let sku = Sku::try_new(s.clone()).unwrap();
            prop_assert_eq!(sku.as_ref(), s.trim());
        }

        #[test]
        fn sku_rejects_blank_strings(s in " {0,32}") {
            prop_assert!(Sku::try_new(s).is_err());
        }

        #[test]
        fn sku_roundtrip_serialization(s in "[a-zA-Z0-9_-]{1,128}") {
            let sku = Sku::try_new(s).unwrap();
            let json = serde_json::to_string(&sku).unwrap();
            let deserialized: Sku = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(sku, deserialized);
        }

        #[test]
        fn quantity_accepts_positive_values(q in 1u64..=u64::MAX) {
            let quantity = Quantity::try_new(q);
            prop_assert!(quantity.is_ok());
            let value: u64 = quantity.unwrap().into();
            prop_assert_eq!(value, q);
        }

        #[test]
        fn quantity_ordering_matches_inner(a in 1u64..=u64::MAX, b in 1u64..=u64::MAX) {
            let qa = Quantity::try_new(a).unwrap();
            let qb = Quantity::try_new(b).unwrap();
            prop_assert_eq!(qa < qb, a < b);
            prop_assert_eq!(qa == qb, a == b);
        }
    }

    #[test]
    fn sku_rejects_specific_invalid_cases() {
        assert!(Sku::try_new("").is_err());
        assert!(Sku::try_new("   ").is_err());
        assert!(Sku::try_new("\t\n").is_err());

        let too_long = "a".repeat(129);
        assert!(Sku::try_new(too_long).is_err());

        // Valid edge case: exactly 128 chars
        let max = "a".repeat(128);
        assert!(Sku::try_new(max).is_ok());
    }

    #[test]
    fn order_id_rejects_blank_and_accepts_trimmed() {
        assert!(OrderId::try_new("").is_err());
        assert!(OrderId::try_new("  ").is_err());

        let id = OrderId::try_new("  order-42  ").unwrap();
        assert_eq!(id.as_ref(), "order-42");
    }

    #[test]
    fn quantity_rejects_zero() {
        assert!(Quantity::try_new(0).is_err());
        assert!(Quantity::try_new(1).is_ok());
    }

    #[test]
    fn timestamp_now_is_monotonic_with_wall_clock() {
        let before = Utc::now();
        let timestamp = Timestamp::now();
        let after = Utc::now();

        assert!(timestamp.as_datetime() >= &before);
        assert!(timestamp.as_datetime() <= &after);
    }

    #[test]
    fn timestamp_roundtrips_through_datetime() {
        let dt = Utc::now();
        let timestamp = Timestamp::from(dt);
        assert_eq!(DateTime::<Utc>::from(timestamp), dt);
    }
}
