//! # Domain Types
//!
//! Core domain types used throughout Shopkeep checkout.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │ InventoryRecord │   │    CartItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │◄──│  product_id     │   │  cart_id        │       │
//! │  │  title          │   │  stock >= 0     │   │  product_id     │       │
//! │  │  unit_price     │   └─────────────────┘   │  quantity > 0   │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! │           │ priced at checkout                                          │
//! │           ▼                                                             │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   PricedLine    │──►│  PurchaseDraft  │──►│    Purchase     │       │
//! │  │ (price frozen)  │   │ (not yet saved) │   │ 1:N line items  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A purchase line keeps the title and unit price that were read from the
//! catalog at checkout time. Later catalog edits never reach a written
//! purchase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Identifiers
// =============================================================================

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
        #[cfg_attr(feature = "sqlx", sqlx(transparent))]
        #[serde(transparent)]
        #[ts(export)]
        pub struct $name(pub i64);

        impl $name {
            /// Returns the raw row id.
            #[inline]
            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

integer_id!(
    /// Catalog product identifier (`products.id`).
    ProductId
);

integer_id!(
    /// Authenticated actor (user) identifier supplied by the identity layer.
    ActorId
);

integer_id!(
    /// Cart identifier (`carts.id`). One cart per actor.
    CartId
);

integer_id!(
    /// Generated purchase identifier (`purchases.id`).
    PurchaseId
);

// =============================================================================
// Catalog & Inventory
// =============================================================================

/// A product as seen by checkout: identity and current price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: ProductId,

    /// Display title, copied onto purchase lines.
    pub title: String,

    /// Current unit price. Read at purchase time, never mutated by checkout.
    pub unit_price: Money,
}

/// Current stock for one product.
///
/// `stock` is never negative; the ledger only decrements when enough
/// stock is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryRecord {
    pub product_id: ProductId,
    pub stock: i64,
}

// =============================================================================
// Cart
// =============================================================================

/// A pending item in an actor's cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CartItem {
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: i64,
}

// =============================================================================
// Pricing
// =============================================================================

/// One product/quantity pair priced against the catalog.
///
/// Created after a successful reservation; the unit price is the one read
/// in the same checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub title: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

impl PricedLine {
    /// Prices `quantity` units of `product`.
    ///
    /// ## Errors
    /// `CoreError::AmountOverflow` when the line total does not fit.
    pub fn new(product: &Product, quantity: i64) -> CoreResult<Self> {
        let line_total = product
            .unit_price
            .checked_multiply_quantity(quantity)
            .ok_or(CoreError::AmountOverflow {
                product_id: Some(product.id),
            })?;

        Ok(PricedLine {
            product_id: product.id,
            title: product.title.clone(),
            quantity,
            unit_price: product.unit_price,
            line_total,
        })
    }
}

/// Everything the Purchase Ledger needs to commit one purchase.
///
/// `consumed_cart_items` lists the cart entries, as loaded, that must
/// disappear in the same commit as the purchase rows. The commit fails if
/// any of them is gone or has a different quantity by then. It is empty for
/// single-item purchases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseDraft {
    pub actor_id: ActorId,
    pub lines: Vec<PricedLine>,
    pub consumed_cart_items: Vec<CartItem>,
}

impl PurchaseDraft {
    /// Draft for a purchase made outside of any cart.
    pub fn single(actor_id: ActorId, line: PricedLine) -> Self {
        PurchaseDraft {
            actor_id,
            lines: vec![line],
            consumed_cart_items: Vec::new(),
        }
    }

    /// Draft for a whole-cart checkout consuming `items`.
    pub fn from_cart(actor_id: ActorId, items: Vec<CartItem>, lines: Vec<PricedLine>) -> Self {
        PurchaseDraft {
            actor_id,
            lines,
            consumed_cart_items: items,
        }
    }

    /// Sum of the frozen line totals.
    pub fn total_amount(&self) -> CoreResult<Money> {
        self.lines.iter().try_fold(Money::zero(), |acc, line| {
            acc.checked_add(line.line_total)
                .ok_or(CoreError::AmountOverflow { product_id: None })
        })
    }
}

// =============================================================================
// Purchase
// =============================================================================

/// A line item in a committed purchase. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseLineItem {
    pub purchase_id: PurchaseId,
    pub product_id: ProductId,
    /// Product title at time of purchase (frozen).
    pub title: String,
    pub quantity: i64,
    /// Unit price at time of purchase (frozen).
    pub unit_price: Money,
    /// unit_price × quantity, stored rather than recomputed.
    pub line_total: Money,
}

/// A committed purchase with its ordered line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Purchase {
    pub id: PurchaseId,
    pub actor_id: ActorId,
    pub total_amount: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub line_items: Vec<PurchaseLineItem>,
}

impl Purchase {
    /// Per-line `(title, quantity, total)` view returned to callers.
    pub fn summaries(&self) -> Vec<PurchaseSummary> {
        self.line_items
            .iter()
            .map(|item| PurchaseSummary {
                title: item.title.clone(),
                quantity: item.quantity,
                total: item.line_total,
            })
            .collect()
    }
}

/// What a successful checkout reports for each line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseSummary {
    pub title: String,
    pub quantity: i64,
    pub total: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn smartphone() -> Product {
        Product {
            id: ProductId(1),
            title: "Smartphone".to_string(),
            unit_price: Money::from_cents(29999),
        }
    }

    fn js_book() -> Product {
        Product {
            id: ProductId(3),
            title: "JavaScript Book".to_string(),
            unit_price: Money::from_cents(2999),
        }
    }

    #[test]
    fn test_priced_line_freezes_price() {
        let mut product = js_book();
        let line = PricedLine::new(&product, 2).unwrap();

        product.unit_price = Money::from_cents(4999);

        assert_eq!(line.unit_price.cents(), 2999);
        assert_eq!(line.line_total.cents(), 5998);
    }

    #[test]
    fn test_priced_line_overflow() {
        let product = Product {
            id: ProductId(9),
            title: "Yacht".to_string(),
            unit_price: Money::from_cents(i64::MAX / 2),
        };
        let err = PricedLine::new(&product, 3).unwrap_err();
        assert!(matches!(
            err,
            CoreError::AmountOverflow {
                product_id: Some(ProductId(9))
            }
        ));
    }

    #[test]
    fn test_cart_draft_total_and_consumed_items() {
        let lines = vec![
            PricedLine::new(&smartphone(), 1).unwrap(),
            PricedLine::new(&js_book(), 2).unwrap(),
        ];
        let items = vec![
            CartItem {
                cart_id: CartId(1),
                product_id: ProductId(1),
                quantity: 1,
            },
            CartItem {
                cart_id: CartId(1),
                product_id: ProductId(3),
                quantity: 2,
            },
        ];
        let draft = PurchaseDraft::from_cart(ActorId(1), items.clone(), lines);

        assert_eq!(draft.total_amount().unwrap().cents(), 35997);
        assert_eq!(draft.consumed_cart_items, items);
    }

    #[test]
    fn test_single_draft_consumes_nothing() {
        let draft = PurchaseDraft::single(ActorId(1), PricedLine::new(&smartphone(), 1).unwrap());
        assert!(draft.consumed_cart_items.is_empty());
        assert_eq!(draft.total_amount().unwrap().cents(), 29999);
    }

    #[test]
    fn test_summaries_follow_line_order() {
        let purchase = Purchase {
            id: PurchaseId(7),
            actor_id: ActorId(1),
            total_amount: Money::from_cents(35997),
            created_at: Utc::now(),
            line_items: vec![
                PurchaseLineItem {
                    purchase_id: PurchaseId(7),
                    product_id: ProductId(1),
                    title: "Smartphone".to_string(),
                    quantity: 1,
                    unit_price: Money::from_cents(29999),
                    line_total: Money::from_cents(29999),
                },
                PurchaseLineItem {
                    purchase_id: PurchaseId(7),
                    product_id: ProductId(3),
                    title: "JavaScript Book".to_string(),
                    quantity: 2,
                    unit_price: Money::from_cents(2999),
                    line_total: Money::from_cents(5998),
                },
            ],
        };

        let summaries = purchase.summaries();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].title, "Smartphone");
        assert_eq!(summaries[1].total.cents(), 5998);
    }

    #[test]
    fn test_id_serializes_transparently() {
        assert_eq!(serde_json::to_string(&ProductId(42)).unwrap(), "42");
        assert_eq!(ProductId(42).to_string(), "42");
    }
}
