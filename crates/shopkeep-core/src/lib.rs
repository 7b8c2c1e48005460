//! # shopkeep-core: Pure Checkout Domain
//!
//! This crate is the **heart** of Shopkeep checkout. It holds the domain
//! types, money arithmetic, validation rules and the collaborator traits
//! the checkout engine talks to. Nothing in here performs I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Shopkeep Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/shopkeep-api (axum)                        │   │
//! │  │        POST /purchase/{productId}     POST /purchase/           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                shopkeep-checkout (CheckoutEngine)               │   │
//! │  │     validate ─► price ─► reserve ─► record ─► clear cart        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ ports                                  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shopkeep-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌────────────┐ ┌──────────────┐    │   │
//! │  │   │  types   │ │  money   │ │   ports    │ │ compensation │    │   │
//! │  │   │ Purchase │ │  Money   │ │ Inventory  │ │ Reservation  │    │   │
//! │  │   │ CartItem │ │          │ │ Ledger ... │ │ log          │    │   │
//! │  │   └──────────┘ └──────────┘ └────────────┘ └──────────────┘    │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                ▲                                        │
//! │  ┌─────────────────────────────┴───────────────────────────────────┐   │
//! │  │              shopkeep-db (implements the ports on SQLite)        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, CartItem, Purchase, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types and the checkout error taxonomy
//! - [`validation`] - Input rule validation
//! - [`compensation`] - Reservation bookkeeping for all-or-nothing checkout
//! - [`ports`] - Collaborator traits (catalog, ledgers, cart store)
//!
//! ## Example Usage
//!
//! ```rust
//! use shopkeep_core::money::Money;
//!
//! let price = Money::from_cents(29999); // 299.99
//! let total = price.checked_multiply_quantity(2).unwrap();
//! assert_eq!(total.to_decimal_string(), "599.98");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod compensation;
pub mod error;
pub mod money;
pub mod ports;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use compensation::{CompensationLog, Reservation};
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use ports::{CartStore, Catalog, InventoryLedger, PurchaseLedger};
pub use types::*;
