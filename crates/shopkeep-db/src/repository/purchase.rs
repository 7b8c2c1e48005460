//! # Purchase Repository
//!
//! The Purchase Ledger on SQLite. Append-only.
//!
//! ## Commit Boundary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    INSERT purchases (user_id, total_amount_cents, purchase_date)       │
//! │    INSERT purchase_items × N   (title + price snapshot per line)       │
//! │    DELETE each consumed cart line (cart, product, quantity)            │
//! │      deleted != consumed lines? ─► ROLLBACK, CartChanged               │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure rolls the whole block back: no purchase without its       │
//! │  lines, no cleared cart without a purchase, and a cart is bought at    │
//! │  most once.                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is not touched here; reservations happen before `record` and are
//! released by the engine if `record` fails.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::cart::consume_items_in;
use shopkeep_core::{
    ActorId, CoreResult, Money, Purchase, PurchaseDraft, PurchaseId, PurchaseLedger,
    PurchaseLineItem,
};

/// Header row of `purchases`.
#[derive(Debug, sqlx::FromRow)]
struct PurchaseRow {
    id: PurchaseId,
    user_id: ActorId,
    total_amount_cents: Money,
    purchase_date: DateTime<Utc>,
}

/// Repository for purchase database operations.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Writes a purchase, its line items and the cart clear in one transaction.
    ///
    /// `total_amount` is stored as given; callers compute it once from the
    /// frozen line totals.
    pub async fn insert(&self, draft: &PurchaseDraft, total_amount: Money) -> DbResult<Purchase> {
        let created_at = Utc::now();

        let mut tx = self.pool.begin().await?;

        let purchase_id: PurchaseId = sqlx::query_scalar(
            r#"
            INSERT INTO purchases (user_id, total_amount_cents, purchase_date)
            VALUES (?1, ?2, ?3)
            RETURNING id
            "#,
        )
        .bind(draft.actor_id)
        .bind(total_amount)
        .bind(created_at)
        .fetch_one(&mut *tx)
        .await?;

        let mut line_items = Vec::with_capacity(draft.lines.len());
        for (line_no, line) in draft.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO purchase_items (
                    purchase_id, line_no, product_id, title,
                    quantity, price_cents, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(purchase_id)
            .bind(line_no as i64)
            .bind(line.product_id)
            .bind(&line.title)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.line_total)
            .execute(&mut *tx)
            .await?;

            line_items.push(PurchaseLineItem {
                purchase_id,
                product_id: line.product_id,
                title: line.title.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                line_total: line.line_total,
            });
        }

        if !draft.consumed_cart_items.is_empty() {
            let consumed = consume_items_in(&mut tx, &draft.consumed_cart_items).await?;
            if consumed != draft.consumed_cart_items.len() as u64 {
                warn!(
                    actor_id = %draft.actor_id,
                    expected = draft.consumed_cart_items.len(),
                    consumed,
                    "Cart changed before commit, rolling back"
                );
                return Err(DbError::CartChanged(draft.actor_id));
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            purchase_id = %purchase_id,
            actor_id = %draft.actor_id,
            lines = line_items.len(),
            total = %total_amount,
            "Purchase recorded"
        );

        Ok(Purchase {
            id: purchase_id,
            actor_id: draft.actor_id,
            total_amount,
            created_at,
            line_items,
        })
    }

    /// Gets a purchase with its ordered line items.
    pub async fn get(&self, id: PurchaseId) -> DbResult<Option<Purchase>> {
        let row = sqlx::query_as::<_, PurchaseRow>(
            r#"
            SELECT id, user_id, total_amount_cents, purchase_date
            FROM purchases
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    /// All purchases of one actor, oldest first.
    pub async fn list_for_actor(&self, actor_id: ActorId) -> DbResult<Vec<Purchase>> {
        debug!(actor_id = %actor_id, "Listing purchases");

        let rows = sqlx::query_as::<_, PurchaseRow>(
            r#"
            SELECT id, user_id, total_amount_cents, purchase_date
            FROM purchases
            WHERE user_id = ?1
            ORDER BY id
            "#,
        )
        .bind(actor_id)
        .fetch_all(&self.pool)
        .await?;

        let mut purchases = Vec::with_capacity(rows.len());
        for row in rows {
            purchases.push(self.hydrate(row).await?);
        }

        Ok(purchases)
    }

    /// Counts purchases (for diagnostics and tests).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM purchases")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn hydrate(&self, row: PurchaseRow) -> DbResult<Purchase> {
        let line_items = sqlx::query_as::<_, PurchaseLineItem>(
            r#"
            SELECT
                purchase_id,
                product_id,
                title,
                quantity,
                price_cents AS unit_price,
                line_total_cents AS line_total
            FROM purchase_items
            WHERE purchase_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Purchase {
            id: row.id,
            actor_id: row.user_id,
            total_amount: row.total_amount_cents,
            created_at: row.purchase_date,
            line_items,
        })
    }
}

#[async_trait]
impl PurchaseLedger for PurchaseRepository {
    async fn record(&self, draft: PurchaseDraft) -> CoreResult<Purchase> {
        let total_amount = draft.total_amount()?;
        Ok(self.insert(&draft, total_amount).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use shopkeep_core::{CoreError, PricedLine, Product};

    async fn setup() -> (Database, Product, Product) {
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
        (db, phone, book)
    }

    #[tokio::test]
    async fn test_record_cart_purchase_clears_cart() {
        let (db, phone, book) = setup().await;
        db.carts().add_item(ActorId(1), phone.id, 1).await.unwrap();
        db.carts().add_item(ActorId(1), book.id, 2).await.unwrap();

        let items = db.carts().load_items(ActorId(1)).await.unwrap();
        let draft = PurchaseDraft::from_cart(
            ActorId(1),
            items,
            vec![
                PricedLine::new(&phone, 1).unwrap(),
                PricedLine::new(&book, 2).unwrap(),
            ],
        );
        let purchase = db.purchases().record(draft).await.unwrap();

        assert_eq!(purchase.total_amount.cents(), 35997);
        assert_eq!(purchase.line_items.len(), 2);
        assert!(db.carts().load_items(ActorId(1)).await.unwrap().is_empty());

        let stored = db.purchases().get(purchase.id).await.unwrap().unwrap();
        assert_eq!(stored.actor_id, ActorId(1));
        assert_eq!(stored.total_amount, purchase.total_amount);
        assert_eq!(stored.line_items, purchase.line_items);
    }

    #[tokio::test]
    async fn test_single_purchase_leaves_cart() {
        let (db, phone, _) = setup().await;
        db.carts().add_item(ActorId(1), phone.id, 1).await.unwrap();

        let draft = PurchaseDraft::single(ActorId(1), PricedLine::new(&phone, 1).unwrap());
        db.purchases().record(draft).await.unwrap();

        assert_eq!(db.carts().load_items(ActorId(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_price_change_does_not_touch_history() {
        let (db, _, book) = setup().await;

        let draft = PurchaseDraft::single(ActorId(1), PricedLine::new(&book, 2).unwrap());
        let purchase = db.purchases().record(draft).await.unwrap();

        db.catalog()
            .update_price(book.id, Money::from_cents(4999))
            .await
            .unwrap();

        let stored = db.purchases().get(purchase.id).await.unwrap().unwrap();
        assert_eq!(stored.total_amount.cents(), 5998);
        assert_eq!(stored.line_items[0].unit_price.cents(), 2999);
    }

    #[tokio::test]
    async fn test_list_for_actor() {
        let (db, phone, book) = setup().await;

        for (actor, product) in [(1, &phone), (2, &book), (1, &book)] {
            let draft = PurchaseDraft::single(ActorId(actor), PricedLine::new(product, 1).unwrap());
            db.purchases().record(draft).await.unwrap();
        }

        let purchases = db.purchases().list_for_actor(ActorId(1)).await.unwrap();
        assert_eq!(purchases.len(), 2);
        assert_eq!(purchases[0].line_items[0].title, "Smartphone");
        assert_eq!(purchases[1].line_items[0].title, "JavaScript Book");
        assert!(db.purchases().get(PurchaseId(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_nothing_behind() {
        let (db, phone, _) = setup().await;
        db.carts().add_item(ActorId(1), phone.id, 1).await.unwrap();

        // A zero quantity violates the purchase_items CHECK after the header
        // row was inserted; the transaction must roll both back.
        let mut line = PricedLine::new(&phone, 1).unwrap();
        line.quantity = 0;
        let items = db.carts().load_items(ActorId(1)).await.unwrap();
        let draft = PurchaseDraft::from_cart(ActorId(1), items, vec![line]);

        assert!(db.purchases().record(draft).await.is_err());
        assert_eq!(db.purchases().count().await.unwrap(), 0);
        let items = db.carts().load_items(ActorId(1)).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, phone.id);
    }

    #[tokio::test]
    async fn test_cart_is_consumed_once() {
        let (db, phone, book) = setup().await;
        db.carts().add_item(ActorId(1), phone.id, 1).await.unwrap();
        db.carts().add_item(ActorId(1), book.id, 2).await.unwrap();

        // Two checkouts that both loaded the same cart
        let items = db.carts().load_items(ActorId(1)).await.unwrap();
        let lines = vec![
            PricedLine::new(&phone, 1).unwrap(),
            PricedLine::new(&book, 2).unwrap(),
        ];
        let first = PurchaseDraft::from_cart(ActorId(1), items.clone(), lines.clone());
        let second = PurchaseDraft::from_cart(ActorId(1), items, lines);

        db.purchases().record(first).await.unwrap();
        let err = db.purchases().record(second).await.unwrap_err();

        assert!(matches!(err, CoreError::CartChanged(ActorId(1))));
        assert_eq!(db.purchases().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_changed_quantity_rolls_back() {
        let (db, phone, book) = setup().await;
        db.carts().add_item(ActorId(1), phone.id, 1).await.unwrap();
        db.carts().add_item(ActorId(1), book.id, 2).await.unwrap();
        let items = db.carts().load_items(ActorId(1)).await.unwrap();

        // The book line grows after the cart was loaded
        db.carts().add_item(ActorId(1), book.id, 1).await.unwrap();

        let draft = PurchaseDraft::from_cart(
            ActorId(1),
            items,
            vec![
                PricedLine::new(&phone, 1).unwrap(),
                PricedLine::new(&book, 2).unwrap(),
            ],
        );
        let err = db.purchases().insert(&draft, Money::from_cents(35997)).await.unwrap_err();

        assert!(matches!(err, DbError::CartChanged(ActorId(1))));
        assert_eq!(db.purchases().count().await.unwrap(), 0);
        let items = db.carts().load_items(ActorId(1)).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].quantity, 3);
    }
}
