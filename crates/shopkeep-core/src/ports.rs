//! # Collaborator Traits
//!
//! The checkout engine only ever talks to storage through these traits.
//! `shopkeep-db` implements them on SQLite; `shopkeep-checkout` ships an
//! in-memory implementation for tests and embedding.
//!
//! ```text
//!                      ┌───────────────────┐
//!                      │  CheckoutEngine   │
//!                      └─────────┬─────────┘
//!        ┌───────────────┬───────┴───────┬────────────────┐
//!        ▼               ▼               ▼                ▼
//!   ┌─────────┐   ┌──────────────┐ ┌───────────┐ ┌────────────────┐
//!   │ Catalog │   │ Inventory    │ │ CartStore │ │ PurchaseLedger │
//!   │ (read)  │   │ Ledger       │ │ load/     │ │ append-only    │
//!   └─────────┘   │ reserve/     │ │ remove    │ └────────────────┘
//!                 │ release      │ └───────────┘
//!                 └──────────────┘
//! ```
//!
//! All traits are object safe and used as `Arc<dyn Trait>`.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{ActorId, CartItem, Product, ProductId, Purchase, PurchaseDraft};

/// Read-only product lookup.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Returns `None` when the product does not exist.
    async fn get_product(&self, product_id: ProductId) -> CoreResult<Option<Product>>;
}

/// Per-product stock with atomic check-and-decrement.
///
/// Implementations must make `reserve` a single atomic step with respect to
/// any other `reserve`/`release` on the same product. Two reservations whose
/// combined quantity exceeds stock must never both succeed.
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Decrements stock by `quantity` iff `stock >= quantity`.
    ///
    /// ## Returns
    /// - `Ok(new_stock)` on success
    /// - `CoreError::InsufficientStock { available, .. }` with nothing changed
    /// - `CoreError::InventoryNotFound` when the product has no record
    async fn reserve(&self, product_id: ProductId, quantity: i64) -> CoreResult<i64>;

    /// Increments stock by `quantity`, returning the new level.
    async fn release(&self, product_id: ProductId, quantity: i64) -> CoreResult<i64>;
}

/// Consumer side of the actor-keyed cart store.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Items in stored order. Empty when the actor has no cart.
    async fn load_items(&self, actor_id: ActorId) -> CoreResult<Vec<CartItem>>;

    /// Removes the given products from the actor's cart.
    ///
    /// Idempotent: absent items and a missing cart are not errors.
    async fn remove_items(&self, actor_id: ActorId, product_ids: &[ProductId]) -> CoreResult<()>;
}

/// Durable, append-only purchase record.
#[async_trait]
pub trait PurchaseLedger: Send + Sync {
    /// Writes the purchase, its line items and the removal of
    /// `draft.consumed_cart_items` as one unit.
    ///
    /// Never leaves a partially written purchase behind. Fails with
    /// `CoreError::CartChanged`, writing nothing, if any consumed cart line
    /// is no longer present with the same quantity.
    async fn record(&self, draft: PurchaseDraft) -> CoreResult<Purchase>;
}
