//! # Catalog Repository
//!
//! Read access to products for checkout, plus the small amount of write
//! access provisioning and tests need (insert, price change).
//!
//! Catalog CRUD as a feature lives outside this workspace; only what the
//! checkout path and seed data touch is here.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use shopkeep_core::validation::{validate_price_cents, validate_product_title};
use shopkeep_core::{Catalog, CoreResult, Money, Product, ProductId};

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get(&self, id: ProductId) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, title, price_cents AS unit_price
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists every product ordered by id.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, title, price_cents AS unit_price FROM products ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product and returns it with its generated id.
    ///
    /// Blank or over-long titles and negative prices are rejected with
    /// `DbError::Validation` before anything is written.
    pub async fn insert(
        &self,
        title: &str,
        unit_price: Money,
        description: Option<&str>,
    ) -> DbResult<Product> {
        validate_product_title(title)?;
        validate_price_cents(unit_price.cents())?;

        debug!(title = %title, price = %unit_price, "Inserting product");

        let id: ProductId = sqlx::query_scalar(
            r#"
            INSERT INTO products (title, price_cents, description)
            VALUES (?1, ?2, ?3)
            RETURNING id
            "#,
        )
        .bind(title)
        .bind(unit_price)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        Ok(Product {
            id,
            title: title.to_string(),
            unit_price,
        })
    }

    /// Changes the current price. Already written purchases are unaffected.
    pub async fn update_price(&self, id: ProductId, unit_price: Money) -> DbResult<()> {
        validate_price_cents(unit_price.cents())?;

        debug!(product_id = %id, price = %unit_price, "Updating product price");

        let result = sqlx::query("UPDATE products SET price_cents = ?2 WHERE id = ?1")
            .bind(id)
            .bind(unit_price)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts total products (for diagnostics and seeding).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl Catalog for CatalogRepository {
    async fn get_product(&self, product_id: ProductId) -> CoreResult<Option<Product>> {
        Ok(self.get(product_id).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
