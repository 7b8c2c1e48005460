//! # Repository Module
//!
//! Database repository implementations for Shopkeep.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories and the ports they serve                │
//! │                                                                         │
//! │  CheckoutEngine                                                        │
//! │       │  Arc<dyn Catalog>, Arc<dyn InventoryLedger>, ...               │
//! │       ▼                                                                 │
//! │  CatalogRepository    ── impl Catalog          (products)              │
//! │  InventoryRepository  ── impl InventoryLedger  (inventory)             │
//! │  CartRepository       ── impl CartStore        (carts, cart_items)     │
//! │  PurchaseRepository   ── impl PurchaseLedger   (purchases, items)      │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each repository also exposes inherent methods returning [`DbResult`]
//! for provisioning, diagnostics and tests. The trait impls translate those
//! into `CoreError` at the port boundary.
//!
//! [`DbResult`]: crate::error::DbResult

pub mod cart;
pub mod inventory;
pub mod product;
pub mod purchase;
