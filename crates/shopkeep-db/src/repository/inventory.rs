//! # Inventory Repository
//!
//! The Inventory Ledger on SQLite.
//!
//! ## Atomic Reserve
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Decrement Strategy                             │
//! │                                                                         │
//! │  ❌ WRONG: read, decide, write (lost update under concurrency)         │
//! │     SELECT stock ...            → 1                                    │
//! │     UPDATE ... SET stock = 0    ← two requests both see 1, both sell   │
//! │                                                                         │
//! │  ✅ CORRECT: one conditional statement                                 │
//! │     UPDATE inventory                                                   │
//! │     SET stock = stock - ?q                                             │
//! │     WHERE product_id = ?p AND stock >= ?q                              │
//! │     RETURNING stock                                                    │
//! │                                                                         │
//! │  SQLite runs each statement under its write lock, so the check and     │
//! │  the decrement cannot be split by another writer.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only when the conditional update touches no row is the current stock
//! read, to tell "no record" apart from "not enough".

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use shopkeep_core::validation::{validate_quantity, validate_stock_level};
use shopkeep_core::{CoreError, CoreResult, InventoryLedger, InventoryRecord, ProductId};

/// What a reserve attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// Stock was decremented; carries the new level.
    Reserved { new_stock: i64 },
    /// Nothing changed; carries the stock seen after the failed attempt.
    Insufficient { available: i64 },
    /// The product has no inventory record.
    NotFound,
}

/// Repository for inventory database operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Atomically decrements stock by `quantity` iff enough is present.
    ///
    /// `quantity` must be positive; the port impl validates it.
    pub async fn reserve(&self, product_id: ProductId, quantity: i64) -> DbResult<ReserveOutcome> {
        let new_stock: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE inventory
            SET stock = stock - ?2
            WHERE product_id = ?1 AND stock >= ?2
            RETURNING stock
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(new_stock) = new_stock {
            debug!(product_id = %product_id, quantity, new_stock, "Stock reserved");
            return Ok(ReserveOutcome::Reserved { new_stock });
        }

        match self.stock(product_id).await? {
            Some(available) => {
                debug!(product_id = %product_id, quantity, available, "Insufficient stock");
                Ok(ReserveOutcome::Insufficient { available })
            }
            None => Ok(ReserveOutcome::NotFound),
        }
    }

    /// Atomically increments stock by `quantity`.
    ///
    /// ## Returns
    /// * `Ok(Some(new_stock))` - Stock released
    /// * `Ok(None)` - No inventory record
    pub async fn release(&self, product_id: ProductId, quantity: i64) -> DbResult<Option<i64>> {
        let new_stock: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE inventory
            SET stock = stock + ?2
            WHERE product_id = ?1
            RETURNING stock
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?;

        debug!(product_id = %product_id, quantity, new_stock = ?new_stock, "Stock released");
        Ok(new_stock)
    }

    /// Current stock for one product, `None` when there is no record.
    pub async fn stock(&self, product_id: ProductId) -> DbResult<Option<i64>> {
        let stock: Option<i64> =
            sqlx::query_scalar("SELECT stock FROM inventory WHERE product_id = ?1")
                .bind(product_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(stock)
    }

    /// All inventory records ordered by product.
    pub async fn list(&self) -> DbResult<Vec<InventoryRecord>> {
        let records = sqlx::query_as::<_, InventoryRecord>(
            "SELECT product_id, stock FROM inventory ORDER BY product_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Creates the inventory record for a newly provisioned product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Product already has a record
    /// * `Err(DbError::ForeignKeyViolation)` - Product does not exist
    pub async fn create(&self, product_id: ProductId, stock: i64) -> DbResult<InventoryRecord> {
        debug!(product_id = %product_id, stock, "Creating inventory record");

        sqlx::query("INSERT INTO inventory (product_id, stock) VALUES (?1, ?2)")
            .bind(product_id)
            .bind(stock)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                    field,
                    value: product_id.to_string(),
                },
                other => other,
            })?;

        Ok(InventoryRecord { product_id, stock })
    }

    /// Sets an absolute stock level (restock or correction).
    pub async fn set_stock(&self, product_id: ProductId, stock: i64) -> DbResult<()> {
        debug!(product_id = %product_id, stock, "Setting stock level");

        let result = sqlx::query("UPDATE inventory SET stock = ?2 WHERE product_id = ?1")
            .bind(product_id)
            .bind(stock)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory", product_id));
        }

        Ok(())
    }

    /// Validated absolute stock change, reported in domain terms.
    pub async fn restock(&self, product_id: ProductId, stock: i64) -> CoreResult<()> {
        validate_stock_level(stock)?;

        match self.set_stock(product_id, stock).await {
            Ok(()) => Ok(()),
            Err(DbError::NotFound { .. }) => Err(CoreError::InventoryNotFound(product_id)),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl InventoryLedger for InventoryRepository {
    async fn reserve(&self, product_id: ProductId, quantity: i64) -> CoreResult<i64> {
        validate_quantity(quantity)?;

        match InventoryRepository::reserve(self, product_id, quantity).await? {
            ReserveOutcome::Reserved { new_stock } => Ok(new_stock),
            ReserveOutcome::Insufficient { available } => Err(CoreError::InsufficientStock {
                product_id,
                available,
                requested: quantity,
            }),
            ReserveOutcome::NotFound => Err(CoreError::InventoryNotFound(product_id)),
        }
    }

    async fn release(&self, product_id: ProductId, quantity: i64) -> CoreResult<i64> {
        validate_quantity(quantity)?;

        match InventoryRepository::release(self, product_id, quantity).await? {
            Some(new_stock) => Ok(new_stock),
            None => {
                warn!(product_id = %product_id, quantity, "Release for product without inventory");
                Err(CoreError::InventoryNotFound(product_id))
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
