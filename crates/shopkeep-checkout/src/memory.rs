//! # In-Memory Store
//!
//! One value implementing every checkout port, for tests and for embedding
//! the engine without a database.
//!
//! ## Locking
//! ```text
//! stock: RwLock<HashMap<ProductId, Arc<Mutex<i64>>>>
//!          │ read lock only to find the cell
//!          ▼
//!        Mutex<i64> per product ← reserve/release hold only this
//! ```
//! Reservations on different products never contend. No lock is held
//! across an `.await`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use shopkeep_core::validation::validate_quantity;
use shopkeep_core::{
    ActorId, CartId, CartItem, CartStore, Catalog, CoreError, CoreResult, InventoryLedger, Money,
    Product, ProductId, Purchase, PurchaseDraft, PurchaseId, PurchaseLedger, PurchaseLineItem,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct Carts {
    ids: HashMap<ActorId, CartId>,
    items: HashMap<ActorId, Vec<CartItem>>,
}

/// In-memory catalog, inventory, carts and purchases.
#[derive(Debug, Default)]
pub struct MemoryStore {
    products: RwLock<HashMap<ProductId, Product>>,
    stock: RwLock<HashMap<ProductId, Arc<Mutex<i64>>>>,
    carts: Mutex<Carts>,
    purchases: Mutex<Vec<Purchase>>,
    next_product_id: AtomicI64,
    next_cart_id: AtomicI64,
    next_purchase_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product together with its inventory record.
    pub fn add_product(&self, title: &str, unit_price: Money, stock: i64) -> Product {
        let product = self.add_catalog_entry(title, unit_price);
        self.stock
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(product.id, Arc::new(Mutex::new(stock)));
        product
    }

    /// Adds a product that has no inventory record.
    pub fn add_catalog_entry(&self, title: &str, unit_price: Money) -> Product {
        let id = ProductId(self.next_product_id.fetch_add(1, Ordering::SeqCst) + 1);
        let product = Product {
            id,
            title: title.to_string(),
            unit_price,
        };
        self.products
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, product.clone());
        product
    }

    pub fn product(&self, product_id: ProductId) -> Option<Product> {
        self.products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&product_id)
            .cloned()
    }

    /// Changes a catalog price. Returns false for unknown products.
    pub fn set_price(&self, product_id: ProductId, unit_price: Money) -> bool {
        let mut products = self.products.write().unwrap_or_else(PoisonError::into_inner);
        match products.get_mut(&product_id) {
            Some(product) => {
                product.unit_price = unit_price;
                true
            }
            None => false,
        }
    }

    pub fn stock(&self, product_id: ProductId) -> Option<i64> {
        self.stock_cell(product_id).map(|cell| *lock(&cell))
    }

    /// Adds to the actor's cart, creating it on first use.
    pub fn add_cart_item(&self, actor_id: ActorId, product_id: ProductId, quantity: i64) -> CartItem {
        let mut carts = lock(&self.carts);
        let next_cart_id = &self.next_cart_id;
        let cart_id = *carts
            .ids
            .entry(actor_id)
            .or_insert_with(|| CartId(next_cart_id.fetch_add(1, Ordering::SeqCst) + 1));

        let items = carts.items.entry(actor_id).or_default();
        match items.iter_mut().find(|i| i.product_id == product_id) {
            Some(existing) => {
                existing.quantity += quantity;
                *existing
            }
            None => {
                let item = CartItem {
                    cart_id,
                    product_id,
                    quantity,
                };
                items.push(item);
                item
            }
        }
    }

    pub fn cart_items(&self, actor_id: ActorId) -> Vec<CartItem> {
        lock(&self.carts)
            .items
            .get(&actor_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Every committed purchase, oldest first.
    pub fn purchases(&self) -> Vec<Purchase> {
        lock(&self.purchases).clone()
    }

    fn stock_cell(&self, product_id: ProductId) -> Option<Arc<Mutex<i64>>> {
        self.stock
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&product_id)
            .cloned()
    }
}

#[async_trait]
impl Catalog for MemoryStore {
    async fn get_product(&self, product_id: ProductId) -> CoreResult<Option<Product>> {
        Ok(self.product(product_id))
    }
}

#[async_trait]
impl InventoryLedger for MemoryStore {
    async fn reserve(&self, product_id: ProductId, quantity: i64) -> CoreResult<i64> {
        validate_quantity(quantity)?;

        let cell = self
            .stock_cell(product_id)
            .ok_or(CoreError::InventoryNotFound(product_id))?;
        let mut stock = lock(&cell);

        if *stock < quantity {
            return Err(CoreError::InsufficientStock {
                product_id,
                available: *stock,
                requested: quantity,
            });
        }

        *stock -= quantity;
        Ok(*stock)
    }

    async fn release(&self, product_id: ProductId, quantity: i64) -> CoreResult<i64> {
        validate_quantity(quantity)?;

        let cell = self
            .stock_cell(product_id)
            .ok_or(CoreError::InventoryNotFound(product_id))?;
        let mut stock = lock(&cell);

        *stock += quantity;
        Ok(*stock)
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn load_items(&self, actor_id: ActorId) -> CoreResult<Vec<CartItem>> {
        Ok(self.cart_items(actor_id))
    }

    async fn remove_items(&self, actor_id: ActorId, product_ids: &[ProductId]) -> CoreResult<()> {
        if let Some(items) = lock(&self.carts).items.get_mut(&actor_id) {
            items.retain(|item| !product_ids.contains(&item.product_id));
        }
        Ok(())
    }
}

#[async_trait]
impl PurchaseLedger for MemoryStore {
    async fn record(&self, draft: PurchaseDraft) -> CoreResult<Purchase> {
        let total_amount = draft.total_amount()?;

        // Carts before purchases, always, so the two locks never invert.
        let mut carts = lock(&self.carts);
        let mut purchases = lock(&self.purchases);

        if !draft.consumed_cart_items.is_empty() {
            let items = carts.items.entry(draft.actor_id).or_default();
            let intact = draft
                .consumed_cart_items
                .iter()
                .all(|consumed| items.contains(consumed));
            if !intact {
                debug!(actor_id = %draft.actor_id, "Cart changed before commit");
                return Err(CoreError::CartChanged(draft.actor_id));
            }
            items.retain(|item| !draft.consumed_cart_items.contains(item));
        }

        let id = PurchaseId(self.next_purchase_id.fetch_add(1, Ordering::SeqCst) + 1);
        let purchase = Purchase {
            id,
            actor_id: draft.actor_id,
            total_amount,
            created_at: Utc::now(),
            line_items: draft
                .lines
                .into_iter()
                .map(|line| PurchaseLineItem {
                    purchase_id: id,
                    product_id: line.product_id,
                    title: line.title,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    line_total: line.line_total,
                })
                .collect(),
        };
        purchases.push(purchase.clone());

        debug!(purchase_id = %id, total = %total_amount, "Purchase stored in memory");
        Ok(purchase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopkeep_core::PricedLine;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_reserve_and_release() {
        let store = MemoryStore::new();
        let p = store.add_product("Smartphone", Money::from_cents(29999), 50);

        assert_eq!(store.reserve(p.id, 1).await.unwrap(), 49);
        assert_eq!(store.release(p.id, 1).await.unwrap(), 50);

        let err = store.reserve(p.id, 51).await.unwrap_err();
        assert_eq!(err.available_quantity(), Some(50));
        assert_eq!(store.stock(p.id), Some(50));
    }

    #[tokio::test]
    async fn test_missing_inventory_record() {
        let store = MemoryStore::new();
        let p = store.add_catalog_entry("Gift Card", Money::from_cents(5000));

        assert!(store.get_product(p.id).await.unwrap().is_some());
        assert!(matches!(
            store.reserve(p.id, 1).await,
            Err(CoreError::InventoryNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cart_remove_is_idempotent() {
        let store = MemoryStore::new();
        let p = store.add_product("T-Shirt", Money::from_cents(1999), 75);
        store.add_cart_item(ActorId(2), p.id, 3);

        store.remove_items(ActorId(2), &[p.id]).await.unwrap();
        store.remove_items(ActorId(2), &[p.id]).await.unwrap();
        store.remove_items(ActorId(3), &[p.id]).await.unwrap();

        assert!(store.load_items(ActorId(2)).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reserve_exactly_k_succeed() {
        let store = Arc::new(MemoryStore::new());
        let p = store.add_product("Laptop", Money::from_cents(79999), 7);

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.reserve(p.id, 1).await })
            })
            .collect();

        let mut ok = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }

        assert_eq!(ok, 7);
        assert_eq!(store.stock(p.id), Some(0));
    }

    #[tokio::test]
    async fn test_cart_is_consumed_once() {
        let store = MemoryStore::new();
        let p = store.add_product("Headphones", Money::from_cents(9999), 100);
        store.add_cart_item(ActorId(1), p.id, 2);

        let items = store.load_items(ActorId(1)).await.unwrap();
        let line = PricedLine::new(&p, 2).unwrap();
        let first = PurchaseDraft::from_cart(ActorId(1), items.clone(), vec![line.clone()]);
        let second = PurchaseDraft::from_cart(ActorId(1), items, vec![line]);

        store.record(first).await.unwrap();
        let err = store.record(second).await.unwrap_err();

        assert!(matches!(err, CoreError::CartChanged(ActorId(1))));
        assert_eq!(store.purchases().len(), 1);
    }

    #[tokio::test]
    async fn test_changed_quantity_is_not_consumed() {
        let store = MemoryStore::new();
        let p = store.add_product("Headphones", Money::from_cents(9999), 100);
        store.add_cart_item(ActorId(1), p.id, 2);
        let items = store.load_items(ActorId(1)).await.unwrap();

        store.add_cart_item(ActorId(1), p.id, 1);

        let draft = PurchaseDraft::from_cart(ActorId(1), items, vec![PricedLine::new(&p, 2).unwrap()]);
        assert!(matches!(
            store.record(draft).await,
            Err(CoreError::CartChanged(_))
        ));
        assert!(store.purchases().is_empty());
        assert_eq!(store.cart_items(ActorId(1))[0].quantity, 3);
    }
}
