//! # Compensation Log
//!
//! Bookkeeping for all-or-nothing checkout.
//!
//! Every successful reservation pushes an undo entry. When a later step of
//! the same attempt fails, the entries are drained newest-first and each one
//! is released back to the Inventory Ledger.
//!
//! ```text
//! reserve(P1, 1) ──► log: [P1×1]
//! reserve(P3, 2) ──► log: [P1×1, P3×2]
//! reserve(P2, 9) ✗ ──► drain: release(P3, 2), release(P1, 1)
//! ```
//!
//! The log itself does no I/O; the engine owns running the releases.

use crate::types::ProductId;

/// One stock decrement that may have to be undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Ordered list of pending compensating releases.
#[derive(Debug, Default)]
pub struct CompensationLog {
    entries: Vec<Reservation>,
}

impl CompensationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a reservation that succeeded.
    pub fn record(&mut self, product_id: ProductId, quantity: i64) {
        self.entries.push(Reservation {
            product_id,
            quantity,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pending reservations in the order they were made.
    pub fn pending(&self) -> &[Reservation] {
        &self.entries
    }

    /// Forgets every entry. Called once the purchase is durably committed.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Takes every entry newest-first, leaving the log empty.
    pub fn drain_reverse(&mut self) -> Vec<Reservation> {
        let mut drained = std::mem::take(&mut self.entries);
        drained.reverse();
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_runs_newest_first() {
        let mut log = CompensationLog::new();
        log.record(ProductId(1), 1);
        log.record(ProductId(3), 2);

        let undo = log.drain_reverse();
        assert_eq!(
            undo,
            vec![
                Reservation {
                    product_id: ProductId(3),
                    quantity: 2
                },
                Reservation {
                    product_id: ProductId(1),
                    quantity: 1
                },
            ]
        );
        assert!(log.is_empty());
        assert!(log.drain_reverse().is_empty());
    }

    #[test]
    fn test_clear_after_commit() {
        let mut log = CompensationLog::new();
        log.record(ProductId(1), 1);
        assert_eq!(log.len(), 1);
        assert_eq!(log.pending()[0].product_id, ProductId(1));

        log.clear();
        assert!(log.is_empty());
    }
}
