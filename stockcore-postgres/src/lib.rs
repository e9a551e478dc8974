//! `PostgreSQL` adapters for the `StockCore` reservation engine
//!
//! This crate implements the `InventoryStore` and `IdempotencyLedger` ports
//! on top of `PostgreSQL` via sqlx. The critical `reserve_all` contract is
//! realized as a single transaction of conditional `UPDATE` statements: each
//! decrement carries its own `quantity >= demanded` guard, and the first
//! guard that matches no row rolls the whole transaction back. Row locks are
//! taken in ascending SKU order (the order a `DemandSet` iterates in), so two
//! reservations sharing SKUs can never deadlock.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use nutype::nutype;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use stockcore::errors::{LedgerError, LedgerResult, StoreError, StoreResult};
use stockcore::ledger::IdempotencyLedger;
use stockcore::store::{InventoryStore, StockRecord};
use stockcore::types::{OrderId, Sku, Timestamp};
use stockcore::DemandSet;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Errors from constructing the adapters themselves (pool setup, schema
/// migration). Runtime operations surface the core's port error types
/// instead.
#[derive(Debug, Error)]
pub enum PostgresAdapterError {
    /// The connection pool could not be created.
    #[error("failed to create postgres connection pool")]
    ConnectionFailed(#[source] sqlx::Error),

    /// Applying the bundled migrations failed.
    #[error("failed to run postgres migrations")]
    MigrationFailed(#[source] sqlx::migrate::MigrateError),
}

/// Maximum number of database connections in the pool.
///
/// Must be at least 1, enforced by using `NonZeroU32` as the underlying type.
#[nutype(derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRef, Into))]
pub struct MaxConnections(std::num::NonZeroU32);

/// Configuration for the adapter connection pool.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Maximum number of connections in the pool (default: 10)
    pub max_connections: MaxConnections,
    /// Timeout for acquiring a connection from the pool (default: 30 seconds)
    pub acquire_timeout: Duration,
    /// Idle timeout for connections in the pool (default: 10 minutes)
    pub idle_timeout: Duration,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        const DEFAULT_MAX_CONNECTIONS: std::num::NonZeroU32 = match std::num::NonZeroU32::new(10) {
            Some(v) => v,
            None => unreachable!(),
        };

        Self {
            max_connections: MaxConnections::new(DEFAULT_MAX_CONNECTIONS),
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

/// Builds a connection pool from a connection string and config.
async fn build_pool(
    connection_string: &str,
    config: &PostgresConfig,
) -> Result<PgPool, PostgresAdapterError> {
    PgPoolOptions::new()
        .max_connections(config.max_connections.into_inner().get())
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .connect(connection_string)
        .await
        .map_err(PostgresAdapterError::ConnectionFailed)
}

fn map_store_error(error: sqlx::Error) -> StoreError {
    match error {
        sqlx::Error::PoolTimedOut => StoreError::Unavailable("connection pool exhausted".into()),
        other => StoreError::Unavailable(other.to_string()),
    }
}

fn map_ledger_error(error: sqlx::Error) -> LedgerError {
    LedgerError::Unavailable(error.to_string())
}

/// Converts a domain quantity to the storage column type.
fn db_quantity(quantity: u64) -> StoreResult<i64> {
    i64::try_from(quantity)
        .map_err(|_| StoreError::Internal(format!("quantity {quantity} exceeds storage range")))
}

/// Converts a storage column value back to the domain quantity.
fn domain_quantity(quantity: i64) -> StoreResult<u64> {
    u64::try_from(quantity)
        .map_err(|_| StoreError::Internal(format!("negative quantity {quantity} in database")))
}

/// `PostgreSQL` implementation of the `InventoryStore` port.
#[derive(Debug, Clone)]
pub struct PostgresInventoryStore {
    pool: PgPool,
}

impl PostgresInventoryStore {
    /// Creates a store with default pool configuration.
    pub async fn new<S: AsRef<str>>(connection_string: S) -> Result<Self, PostgresAdapterError> {
        Self::with_config(connection_string, PostgresConfig::default()).await
    }

    /// Creates a store with explicit pool configuration.
    pub async fn with_config<S: AsRef<str>>(
        connection_string: S,
        config: PostgresConfig,
    ) -> Result<Self, PostgresAdapterError> {
        let pool = build_pool(connection_string.as_ref(), &config).await?;
        Ok(Self { pool })
    }

    /// Wraps an existing pool. Use this to share one pool across the store
    /// and the ledger.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the bundled schema migrations.
    pub async fn migrate(&self) -> Result<(), PostgresAdapterError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(PostgresAdapterError::MigrationFailed)
    }

    /// The underlying pool, for sharing with [`PostgresIdempotencyLedger`].
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    #[instrument(name = "postgres.get", skip(self))]
    async fn get(&self, sku: &Sku) -> StoreResult<Option<StockRecord>> {
        let row = sqlx::query(
            "SELECT quantity, updated_at FROM stock_records WHERE sku = $1",
        )
        .bind(sku.as_ref())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_store_error)?;

        row.map(|row| {
            let quantity: i64 = row.try_get("quantity").map_err(map_store_error)?;
            let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(map_store_error)?;
            Ok(StockRecord {
                sku: sku.clone(),
                quantity: domain_quantity(quantity)?,
                updated_at: Timestamp::new(updated_at),
            })
        })
        .transpose()
    }

    #[instrument(name = "postgres.create", skip(self))]
    async fn create(&self, sku: &Sku, quantity: u64) -> StoreResult<StockRecord> {
        let row = sqlx::query(
            "INSERT INTO stock_records (sku, quantity, updated_at)
             VALUES ($1, $2, now())
             ON CONFLICT (sku) DO NOTHING
             RETURNING updated_at",
        )
        .bind(sku.as_ref())
        .bind(db_quantity(quantity)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_store_error)?;

        match row {
            Some(row) => {
                let updated_at: DateTime<Utc> =
                    row.try_get("updated_at").map_err(map_store_error)?;
                info!(sku = %sku, quantity, "stock record created");
                Ok(StockRecord {
                    sku: sku.clone(),
                    quantity,
                    updated_at: Timestamp::new(updated_at),
                })
            }
            None => Err(StoreError::AlreadyExists(sku.clone())),
        }
    }

    #[instrument(name = "postgres.adjust", skip(self))]
    async fn adjust(&self, sku: &Sku, delta: i64) -> StoreResult<StockRecord> {
        let row = sqlx::query(
            "UPDATE stock_records
             SET quantity = quantity + $2, updated_at = now()
             WHERE sku = $1 AND quantity + $2 >= 0
             RETURNING quantity, updated_at",
        )
        .bind(sku.as_ref())
        .bind(delta)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_store_error)?;

        match row {
            Some(row) => {
                let quantity: i64 = row.try_get("quantity").map_err(map_store_error)?;
                let updated_at: DateTime<Utc> =
                    row.try_get("updated_at").map_err(map_store_error)?;
                Ok(StockRecord {
                    sku: sku.clone(),
                    quantity: domain_quantity(quantity)?,
                    updated_at: Timestamp::new(updated_at),
                })
            }
            // The guard matched no row: either the SKU is missing or the
            // adjustment would underflow. Disambiguate with a read.
            None => match self.get(sku).await? {
                Some(record) => Err(StoreError::StockUnderflow {
                    sku: sku.clone(),
                    current: record.quantity,
                    delta,
                }),
                None => Err(StoreError::SkuNotFound(sku.clone())),
            },
        }
    }

    #[instrument(name = "postgres.reserve_all", skip(self, demands), fields(demand_count = demands.len()))]
    async fn reserve_all(&self, demands: &DemandSet) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await.map_err(map_store_error)?;

        for demand in demands {
            let result = sqlx::query(
                "UPDATE stock_records
                 SET quantity = quantity - $2, updated_at = now()
                 WHERE sku = $1 AND quantity >= $2",
            )
            .bind(demand.sku.as_ref())
            .bind(db_quantity(demand.quantity.into_inner())?)
            .execute(&mut *tx)
            .await
            .map_err(map_store_error)?;

            if result.rows_affected() == 0 {
                // Short or absent SKU: the whole batch is rejected and every
                // decrement applied so far is rolled back.
                debug!(sku = %demand.sku, "insufficient stock, rolling back batch");
                tx.rollback().await.map_err(map_store_error)?;
                return Ok(false);
            }
        }

        tx.commit().await.map_err(map_store_error)?;
        info!(demand_count = demands.len(), "reservation batch committed");
        Ok(true)
    }
}

/// `PostgreSQL` implementation of the `IdempotencyLedger` port.
///
/// Entries past `expires_at` read as unfinalized; a periodic sweep (or table
/// TTL tooling) may purge them at leisure without affecting correctness.
#[derive(Debug, Clone)]
pub struct PostgresIdempotencyLedger {
    pool: PgPool,
}

impl PostgresIdempotencyLedger {
    /// Creates a ledger with default pool configuration.
    pub async fn new<S: AsRef<str>>(connection_string: S) -> Result<Self, PostgresAdapterError> {
        let pool = build_pool(connection_string.as_ref(), &PostgresConfig::default()).await?;
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Deletes expired entries. Optional housekeeping; correctness does not
    /// depend on it.
    pub async fn purge_expired(&self) -> LedgerResult<u64> {
        let result = sqlx::query("DELETE FROM finalized_orders WHERE expires_at <= now()")
            .execute(&self.pool)
            .await
            .map_err(map_ledger_error)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl IdempotencyLedger for PostgresIdempotencyLedger {
    #[instrument(name = "postgres.is_finalized", skip(self))]
    async fn is_finalized(&self, order_id: &OrderId) -> LedgerResult<bool> {
        let row = sqlx::query(
            "SELECT EXISTS(
                 SELECT 1 FROM finalized_orders
                 WHERE order_id = $1 AND expires_at > now()
             ) AS finalized",
        )
        .bind(order_id.as_ref())
        .fetch_one(&self.pool)
        .await
        .map_err(map_ledger_error)?;

        row.try_get("finalized").map_err(map_ledger_error)
    }

    #[instrument(name = "postgres.mark_finalized", skip(self, retention))]
    async fn mark_finalized(&self, order_id: &OrderId, retention: Duration) -> LedgerResult<()> {
        let retention = TimeDelta::from_std(retention).unwrap_or(TimeDelta::MAX);
        let expires_at = Utc::now()
            .checked_add_signed(retention)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        // A live row is never mutated; only an expired row is re-armed.
        sqlx::query(
            "INSERT INTO finalized_orders (order_id, expires_at, recorded_at)
             VALUES ($1, $2, now())
             ON CONFLICT (order_id) DO UPDATE
                 SET expires_at = EXCLUDED.expires_at, recorded_at = now()
                 WHERE finalized_orders.expires_at <= now()",
        )
        .bind(order_id.as_ref())
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(map_ledger_error)?;

        Ok(())
    }
}
