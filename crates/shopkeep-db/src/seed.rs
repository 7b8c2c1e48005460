//! # Sample Data
//!
//! The storefront's sample catalog, shared by the `seed` binary and the API
//! (`SHOPKEEP_SEED=true`).
//!
//! | Product         | Price  | Stock |
//! |-----------------|--------|-------|
//! | Smartphone      | 299.99 | 50    |
//! | Laptop          | 799.99 | 30    |
//! | JavaScript Book | 29.99  | 100   |
//! | T-Shirt         | 19.99  | 75    |
//!
//! Carts: actor 1 holds Smartphone ×1 and JavaScript Book ×2; actor 2 holds
//! Laptop ×1 and T-Shirt ×3.

use tracing::info;

use crate::error::DbResult;
use crate::pool::Database;
use shopkeep_core::{ActorId, Money};

/// (title, price in cents, description, stock)
pub const SAMPLE_PRODUCTS: &[(&str, i64, &str, i64)] = &[
    ("Smartphone", 29999, "Latest model with high resolution camera", 50),
    ("Laptop", 79999, "High-performance laptop for gaming and work", 30),
    ("JavaScript Book", 2999, "Learn JavaScript from scratch", 100),
    ("T-Shirt", 1999, "Comfortable cotton t-shirt", 75),
];

/// (actor, index into SAMPLE_PRODUCTS, quantity)
pub const SAMPLE_CART_ITEMS: &[(i64, usize, i64)] = &[(1, 0, 1), (1, 2, 2), (2, 1, 1), (2, 3, 3)];

/// What [`seed_sample_data`] inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub products: usize,
    pub cart_items: usize,
}

/// Loads the sample data into an empty catalog.
///
/// Returns `None` without touching anything when products already exist.
pub async fn seed_sample_data(db: &Database) -> DbResult<Option<SeedReport>> {
    let existing = db.catalog().count().await?;
    if existing > 0 {
        info!(existing, "Catalog not empty, skipping sample data");
        return Ok(None);
    }

    let mut report = SeedReport::default();
    let mut product_ids = Vec::with_capacity(SAMPLE_PRODUCTS.len());

    for (title, cents, description, stock) in SAMPLE_PRODUCTS {
        let product = db
            .catalog()
            .insert(title, Money::from_cents(*cents), Some(*description))
            .await?;
        db.inventory().create(product.id, *stock).await?;
        product_ids.push(product.id);
        report.products += 1;
    }

    for (actor, index, quantity) in SAMPLE_CART_ITEMS {
        db.carts()
            .add_item(ActorId(*actor), product_ids[*index], *quantity)
            .await?;
        report.cart_items += 1;
    }

    info!(
        products = report.products,
        cart_items = report.cart_items,
        "Sample data loaded"
    );
    Ok(Some(report))
}
