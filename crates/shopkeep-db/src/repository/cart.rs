//! # Cart Repository
//!
//! The Cart Store on SQLite: one cart per actor, keyed by `carts.user_id`.
//!
//! Checkout only reads and clears carts. `add_item` exists for
//! provisioning and seed data.

use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use shopkeep_core::{ActorId, CartId, CartItem, CartStore, CoreResult, ProductId};

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// The actor's cart id, if a cart exists.
    pub async fn cart_id(&self, actor_id: ActorId) -> DbResult<Option<CartId>> {
        let id: Option<CartId> = sqlx::query_scalar("SELECT id FROM carts WHERE user_id = ?1")
            .bind(actor_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(id)
    }

    /// Items in the actor's cart, in insertion order.
    pub async fn load_items(&self, actor_id: ActorId) -> DbResult<Vec<CartItem>> {
        let items = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT ci.cart_id, ci.product_id, ci.quantity
            FROM cart_items ci
            INNER JOIN carts c ON c.id = ci.cart_id
            WHERE c.user_id = ?1
            ORDER BY ci.id
            "#,
        )
        .bind(actor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Removes products from the actor's cart. Returns the rows deleted.
    pub async fn remove_items(&self, actor_id: ActorId, product_ids: &[ProductId]) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;
        let removed = remove_items_in(&mut tx, actor_id, product_ids).await?;
        tx.commit().await?;

        Ok(removed)
    }

    /// Adds `quantity` of a product to the actor's cart, creating the cart on
    /// first use. Adding a product already in the cart increases its quantity.
    pub async fn add_item(
        &self,
        actor_id: ActorId,
        product_id: ProductId,
        quantity: i64,
    ) -> DbResult<CartItem> {
        debug!(actor_id = %actor_id, product_id = %product_id, quantity, "Adding cart item");

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO carts (user_id) VALUES (?1) ON CONFLICT(user_id) DO NOTHING")
            .bind(actor_id)
            .execute(&mut *tx)
            .await?;

        let cart_id: CartId = sqlx::query_scalar("SELECT id FROM carts WHERE user_id = ?1")
            .bind(actor_id)
            .fetch_one(&mut *tx)
            .await?;

        let item = sqlx::query_as::<_, CartItem>(
            r#"
            INSERT INTO cart_items (cart_id, product_id, quantity)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(cart_id, product_id)
            DO UPDATE SET quantity = quantity + excluded.quantity
            RETURNING cart_id, product_id, quantity
            "#,
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(item)
    }
}

/// Deletes cart lines on an existing connection so callers can make the
/// removal part of a larger transaction.
pub(crate) async fn remove_items_in(
    conn: &mut SqliteConnection,
    actor_id: ActorId,
    product_ids: &[ProductId],
) -> DbResult<u64> {
    let mut removed = 0;

    for product_id in product_ids {
        let result = sqlx::query(
            r#"
            DELETE FROM cart_items
            WHERE product_id = ?2
              AND cart_id IN (SELECT id FROM carts WHERE user_id = ?1)
            "#,
        )
        .bind(actor_id)
        .bind(*product_id)
        .execute(&mut *conn)
        .await?;

        removed += result.rows_affected();
    }

    debug!(actor_id = %actor_id, requested = product_ids.len(), removed, "Cart items removed");
    Ok(removed)
}

/// Deletes exactly the given cart lines, each matched on cart, product and
/// quantity. Returns how many matched; a line that was already removed or
/// whose quantity changed counts as zero.
pub(crate) async fn consume_items_in(
    conn: &mut SqliteConnection,
    items: &[CartItem],
) -> DbResult<u64> {
    let mut consumed = 0;

    for item in items {
        let result = sqlx::query(
            "DELETE FROM cart_items WHERE cart_id = ?1 AND product_id = ?2 AND quantity = ?3",
        )
        .bind(item.cart_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .execute(&mut *conn)
        .await?;

        consumed += result.rows_affected();
    }

    Ok(consumed)
}

#[async_trait]
impl CartStore for CartRepository {
    async fn load_items(&self, actor_id: ActorId) -> CoreResult<Vec<CartItem>> {
        Ok(CartRepository::load_items(self, actor_id).await?)
    }

    async fn remove_items(&self, actor_id: ActorId, product_ids: &[ProductId]) -> CoreResult<()> {
        CartRepository::remove_items(self, actor_id, product_ids).await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use shopkeep_core::Money;

    async fn setup() -> (Database, ProductId, ProductId) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let phone = db
            .catalog()
            .insert("Smartphone", Money::from_cents(29999), None)
            .await
            .unwrap();
        let book = db
            .catalog()
            .insert("JavaScript Book", Money::from_cents(2999), None)
            .await
            .unwrap();
        (db, phone.id, book.id)
    }

    #[tokio::test]
    async fn test_missing_cart_loads_empty() {
        let (db, _, _) = setup().await;

        assert!(db.carts().load_items(ActorId(1)).await.unwrap().is_empty());
        assert!(db.carts().cart_id(ActorId(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_items_keeps_order() {
        let (db, phone, book) = setup().await;
        let carts = db.carts();

        carts.add_item(ActorId(1), phone, 1).await.unwrap();
        carts.add_item(ActorId(1), book, 2).await.unwrap();

        let items = carts.load_items(ActorId(1)).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].product_id, phone);
        assert_eq!(items[1].product_id, book);
        assert_eq!(items[1].quantity, 2);
        assert_eq!(Some(items[0].cart_id), carts.cart_id(ActorId(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_add_same_product_accumulates() {
        let (db, phone, _) = setup().await;
        let carts = db.carts();

        carts.add_item(ActorId(1), phone, 1).await.unwrap();
        let item = carts.add_item(ActorId(1), phone, 2).await.unwrap();

        assert_eq!(item.quantity, 3);
        assert_eq!(carts.load_items(ActorId(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_carts_are_per_actor() {
        let (db, phone, book) = setup().await;
        let carts = db.carts();

        carts.add_item(ActorId(1), phone, 1).await.unwrap();
        carts.add_item(ActorId(2), book, 3).await.unwrap();

        carts.remove_items(ActorId(1), &[phone, book]).await.unwrap();

        assert!(carts.load_items(ActorId(1)).await.unwrap().is_empty());
        assert_eq!(carts.load_items(ActorId(2)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let (db, phone, book) = setup().await;
        let carts = db.carts();
        carts.add_item(ActorId(1), phone, 1).await.unwrap();
        carts.add_item(ActorId(1), book, 2).await.unwrap();

        assert_eq!(carts.remove_items(ActorId(1), &[phone, book]).await.unwrap(), 2);
        assert_eq!(carts.remove_items(ActorId(1), &[phone, book]).await.unwrap(), 0);

        // Through the port, and for an actor that never had a cart
        let store: &dyn CartStore = &carts;
        store.remove_items(ActorId(1), &[phone]).await.unwrap();
        store.remove_items(ActorId(9), &[phone]).await.unwrap();
    }
}
