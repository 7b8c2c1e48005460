//! # Compensation Guard
//!
//! Owns the reservations of one checkout attempt until they are either
//! committed or released.
//!
//! ## Reserve and commit run as tasks
//! A request future can be dropped at any `.await` (client gone, deadline
//! hit). A store call that was already sent may still complete after that,
//! so the guard never lets the outcome of a store call depend on the
//! request future staying alive:
//!
//! ```text
//!   reserve task ──Ok──► attempt still open?  ── yes ─► log.record()
//!                                             └─ no ──► release at once
//!
//!   commit task  ──► record(draft) ──Ok──► clear log
//!                                  └─Err─► release everything in the log
//!
//!   guard dropped while open ──► spawn releases for everything logged
//! ```
//!
//! Once a commit has started, its task alone decides what happens to the
//! reservations.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shopkeep_core::{
    CompensationLog, CoreError, CoreResult, InventoryLedger, ProductId, Purchase, PurchaseDraft,
    PurchaseLedger, Reservation,
};
use tokio::runtime::Handle;
use tokio::task::JoinError;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Reservations may still be added.
    Open,
    /// A commit task owns the log.
    Committing,
    /// Committed or released; late reservations must undo themselves.
    Settled,
}

#[derive(Debug)]
struct Pending {
    log: CompensationLog,
    phase: Phase,
}

fn lock(pending: &Mutex<Pending>) -> MutexGuard<'_, Pending> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

fn task_failed(what: &str, err: JoinError) -> CoreError {
    CoreError::storage(format!("{what} task failed: {err}"))
}

/// Pending reservations of one checkout attempt.
pub struct CompensationGuard {
    inventory: Arc<dyn InventoryLedger>,
    pending: Arc<Mutex<Pending>>,
}

impl CompensationGuard {
    pub fn new(inventory: Arc<dyn InventoryLedger>) -> Self {
        CompensationGuard {
            inventory,
            pending: Arc::new(Mutex::new(Pending {
                log: CompensationLog::new(),
                phase: Phase::Open,
            })),
        }
    }

    /// Number of reservations currently held.
    pub fn held(&self) -> usize {
        lock(&self.pending).log.len()
    }

    /// Reserves stock and records the reservation for compensation.
    pub async fn reserve(&self, product_id: ProductId, quantity: i64) -> CoreResult<i64> {
        let inventory = Arc::clone(&self.inventory);
        let pending = Arc::clone(&self.pending);

        let task = tokio::spawn(async move {
            let new_stock = inventory.reserve(product_id, quantity).await?;

            let abandoned = {
                let mut pending = lock(&pending);
                if pending.phase == Phase::Open {
                    pending.log.record(product_id, quantity);
                    false
                } else {
                    true
                }
            };

            if abandoned {
                warn!(
                    product_id = %product_id,
                    quantity,
                    "Reservation completed after the attempt was abandoned, releasing"
                );
                release_all(
                    inventory.as_ref(),
                    vec![Reservation {
                        product_id,
                        quantity,
                    }],
                )
                .await;
            } else {
                debug!(product_id = %product_id, quantity, new_stock, "Reserved");
            }

            Ok::<_, CoreError>(new_stock)
        });

        task.await.map_err(|e| task_failed("reserve", e))?
    }

    /// Writes the purchase. On failure every held reservation is released
    /// before the error is returned.
    pub async fn commit(
        self,
        purchases: Arc<dyn PurchaseLedger>,
        draft: PurchaseDraft,
    ) -> CoreResult<Purchase> {
        lock(&self.pending).phase = Phase::Committing;

        let inventory = Arc::clone(&self.inventory);
        let pending = Arc::clone(&self.pending);

        let task = tokio::spawn(async move {
            let result = purchases.record(draft).await;

            let undo = {
                let mut pending = lock(&pending);
                pending.phase = Phase::Settled;
                match &result {
                    Ok(_) => {
                        pending.log.clear();
                        Vec::new()
                    }
                    Err(_) => pending.log.drain_reverse(),
                }
            };

            if let Err(err) = &result {
                warn!(error = %err, releasing = undo.len(), "Purchase commit failed");
                release_all(inventory.as_ref(), undo).await;
            }

            result
        });

        task.await.map_err(|e| task_failed("commit", e))?
    }

    /// Releases every held reservation, newest first.
    pub async fn unwind(self) {
        let undo = self.settle();
        if !undo.is_empty() {
            debug!(releasing = undo.len(), "Unwinding reservations");
            release_all(self.inventory.as_ref(), undo).await;
        }
    }

    /// Closes the attempt and takes whatever it still holds.
    fn settle(&self) -> Vec<Reservation> {
        let mut pending = lock(&self.pending);
        if pending.phase != Phase::Open {
            return Vec::new();
        }
        pending.phase = Phase::Settled;
        pending.log.drain_reverse()
    }
}

impl Drop for CompensationGuard {
    fn drop(&mut self) {
        let undo = self.settle();
        if undo.is_empty() {
            return;
        }

        match Handle::try_current() {
            Ok(handle) => {
                warn!(releasing = undo.len(), "Checkout abandoned, releasing reservations");
                let inventory = Arc::clone(&self.inventory);
                handle.spawn(async move { release_all(inventory.as_ref(), undo).await });
            }
            Err(_) => {
                error!(
                    leaked = ?undo,
                    "Checkout abandoned outside a runtime, reservations not released"
                );
            }
        }
    }
}

/// Runs compensating releases in the given order. Failures are logged and
/// do not stop the remaining releases.
async fn release_all(inventory: &dyn InventoryLedger, undo: Vec<Reservation>) {
    for Reservation {
        product_id,
        quantity,
    } in undo
    {
        match inventory.release(product_id, quantity).await {
            Ok(new_stock) => {
                debug!(product_id = %product_id, quantity, new_stock, "Released");
            }
            Err(err) => {
                error!(
                    product_id = %product_id,
                    quantity,
                    error = %err,
                    "Compensating release failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use shopkeep_core::{ActorId, Money, PricedLine};
    use std::time::Duration;

    fn store_with(stock: &[i64]) -> (Arc<MemoryStore>, Vec<ProductId>) {
        let store = Arc::new(MemoryStore::new());
        let ids = stock
            .iter()
            .enumerate()
            .map(|(i, s)| {
                store
                    .add_product(&format!("Item {i}"), Money::from_cents(100), *s)
                    .id
            })
            .collect();
        (store, ids)
    }

    #[tokio::test]
    async fn test_unwind_restores_stock() {
        let (store, ids) = store_with(&[10, 10]);
        let guard = CompensationGuard::new(store.clone());

        guard.reserve(ids[0], 3).await.unwrap();
        guard.reserve(ids[1], 4).await.unwrap();
        assert_eq!(guard.held(), 2);

        guard.unwind().await;
        assert_eq!(store.stock(ids[0]), Some(10));
        assert_eq!(store.stock(ids[1]), Some(10));
    }

    #[tokio::test]
    async fn test_failed_reserve_is_not_held() {
        let (store, ids) = store_with(&[1]);
        let guard = CompensationGuard::new(store.clone());

        assert!(guard.reserve(ids[0], 2).await.is_err());
        assert_eq!(guard.held(), 0);
    }

    #[tokio::test]
    async fn test_commit_keeps_stock_reserved() {
        let (store, ids) = store_with(&[10]);
        let guard = CompensationGuard::new(store.clone());

        guard.reserve(ids[0], 2).await.unwrap();
        let product = store.product(ids[0]).unwrap();
        let draft = PurchaseDraft::single(ActorId(1), PricedLine::new(&product, 2).unwrap());
        guard.commit(store.clone(), draft).await.unwrap();

        assert_eq!(store.stock(ids[0]), Some(8));
        assert_eq!(store.purchases().len(), 1);
    }

    #[tokio::test]
    async fn test_drop_releases_on_runtime() {
        let (store, ids) = store_with(&[5]);
        {
            let guard = CompensationGuard::new(store.clone());
            guard.reserve(ids[0], 5).await.unwrap();
            assert_eq!(store.stock(ids[0]), Some(0));
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.stock(ids[0]), Some(5));
    }
}
