//! # Checkout Engine
//!
//! Single-item and whole-cart purchases on top of the four ports.
//!
//! Every attempt owns a [`CompensationGuard`]. Lines are reserved one at a
//! time, in stored cart order, through the guard; the first failure unwinds
//! every reservation made so far (newest first) and is returned unchanged.
//! Only when every line is reserved and priced does the purchase get
//! written, and the cart entries it consumed disappear in that same write.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use shopkeep_core::validation::validate_quantity;
use shopkeep_core::{
    ActorId, CartStore, Catalog, CoreError, CoreResult, InventoryLedger, PricedLine, ProductId,
    Purchase, PurchaseDraft, PurchaseLedger,
};

use crate::guard::CompensationGuard;

/// Default per-attempt deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Checkout tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// Deadline for validating, pricing and reserving every line.
    ///
    /// `None` waits indefinitely. A commit that has started always runs to
    /// completion, so the reported outcome matches what was stored.
    pub timeout: Option<Duration>,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        CheckoutConfig {
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl CheckoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }
}

/// Orchestrates purchases against the catalog, inventory, carts and ledger.
///
/// Cheap to clone; all collaborators are shared.
#[derive(Clone)]
pub struct CheckoutEngine {
    catalog: Arc<dyn Catalog>,
    inventory: Arc<dyn InventoryLedger>,
    carts: Arc<dyn CartStore>,
    purchases: Arc<dyn PurchaseLedger>,
    config: CheckoutConfig,
}

impl CheckoutEngine {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        inventory: Arc<dyn InventoryLedger>,
        carts: Arc<dyn CartStore>,
        purchases: Arc<dyn PurchaseLedger>,
    ) -> Self {
        CheckoutEngine {
            catalog,
            inventory,
            carts,
            purchases,
            config: CheckoutConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CheckoutConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Buys `quantity` units of one product, independent of any cart.
    ///
    /// ## Errors
    /// - `Validation` when `quantity <= 0`, nothing touched
    /// - `ProductNotFound` / `InventoryNotFound`
    /// - `InsufficientStock` carrying the available quantity, stock unchanged
    /// - `Timeout`, `Storage` with every reservation released
    pub async fn purchase_item(
        &self,
        actor_id: ActorId,
        product_id: ProductId,
        quantity: i64,
    ) -> CoreResult<Purchase> {
        debug!(actor_id = %actor_id, product_id = %product_id, quantity, "purchase_item");

        let guard = CompensationGuard::new(Arc::clone(&self.inventory));

        let reserved = self
            .within_deadline(self.reserve_line(&guard, product_id, quantity))
            .await;

        let line = match reserved {
            Ok(line) => line,
            Err(err) => {
                warn!(
                    actor_id = %actor_id,
                    product_id = %product_id,
                    quantity,
                    error = %err,
                    "Single-item purchase rejected"
                );
                guard.unwind().await;
                return Err(err);
            }
        };

        let purchase = guard
            .commit(
                Arc::clone(&self.purchases),
                PurchaseDraft::single(actor_id, line),
            )
            .await?;

        info!(
            purchase_id = %purchase.id,
            actor_id = %actor_id,
            product_id = %product_id,
            quantity,
            total = %purchase.total_amount,
            "Single-item purchase committed"
        );

        Ok(purchase)
    }

    /// Buys everything in the actor's cart as one purchase and empties it.
    ///
    /// All-or-nothing: on any failure no purchase is written, no cart item
    /// is removed and stock is back where it started. The error is the one
    /// raised by the first failing line.
    pub async fn purchase_cart(&self, actor_id: ActorId) -> CoreResult<Purchase> {
        debug!(actor_id = %actor_id, "purchase_cart");

        let guard = CompensationGuard::new(Arc::clone(&self.inventory));

        let reserved = self
            .within_deadline(self.reserve_cart(&guard, actor_id))
            .await;

        let draft = match reserved {
            Ok(draft) => draft,
            Err(err) => {
                warn!(
                    actor_id = %actor_id,
                    product_id = ?err.product_id(),
                    reserved = guard.held(),
                    error = %err,
                    "Cart checkout rejected"
                );
                guard.unwind().await;
                return Err(err);
            }
        };

        let lines = draft.lines.len();
        let purchase = guard.commit(Arc::clone(&self.purchases), draft).await?;

        info!(
            purchase_id = %purchase.id,
            actor_id = %actor_id,
            lines,
            total = %purchase.total_amount,
            "Cart checkout committed"
        );

        Ok(purchase)
    }

    /// Validate, look up, reserve, price. The reservation is held by the
    /// guard from the moment it succeeds.
    async fn reserve_line(
        &self,
        guard: &CompensationGuard,
        product_id: ProductId,
        quantity: i64,
    ) -> CoreResult<PricedLine> {
        validate_quantity(quantity)?;

        let product = self
            .catalog
            .get_product(product_id)
            .await?
            .ok_or(CoreError::ProductNotFound(product_id))?;

        guard.reserve(product_id, quantity).await?;

        PricedLine::new(&product, quantity)
    }

    async fn reserve_cart(
        &self,
        guard: &CompensationGuard,
        actor_id: ActorId,
    ) -> CoreResult<PurchaseDraft> {
        let items = self.carts.load_items(actor_id).await?;
        if items.is_empty() {
            return Err(CoreError::EmptyCart(actor_id));
        }

        let mut lines = Vec::with_capacity(items.len());
        for item in &items {
            lines.push(self.reserve_line(guard, item.product_id, item.quantity).await?);
        }

        let draft = PurchaseDraft::from_cart(actor_id, items, lines);
        draft.total_amount()?;
        Ok(draft)
    }

    async fn within_deadline<T>(
        &self,
        attempt: impl Future<Output = CoreResult<T>>,
    ) -> CoreResult<T> {
        let Some(limit) = self.config.timeout else {
            return attempt.await;
        };

        match tokio::time::timeout(limit, attempt).await {
            Ok(result) => result,
            Err(_) => Err(CoreError::Timeout {
                after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}
