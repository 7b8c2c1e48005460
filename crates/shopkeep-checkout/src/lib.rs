//! # shopkeep-checkout: Checkout Engine
//!
//! Turns a single purchase request or a whole cart into a committed
//! purchase, all-or-nothing.
//!
//! ## Attempt Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       One Checkout Attempt                              │
//! │                                                                         │
//! │  ┌───────────── deadline (CheckoutConfig::timeout) ─────────────┐      │
//! │  │  for each line (stored order):                               │      │
//! │  │    validate qty ─► catalog lookup ─► reserve ─► price        │      │
//! │  │                                        │                     │      │
//! │  │                           guard.record(product, qty)         │      │
//! │  └──────────────────────────────────────────────────────────────┘      │
//! │           │ ok                                   │ error / timeout      │
//! │           ▼                                      ▼                      │
//! │  commit: record purchase + consume cart  release newest-first          │
//! │  (one store transaction; fails with      return first error            │
//! │   CartChanged if the cart moved on)                                     │
//! │           │ error                                                       │
//! │           └──────────────► release newest-first                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`engine`] - `CheckoutEngine` and `CheckoutConfig`
//! - [`guard`] - Compensation guard that owns pending reservations
//! - [`memory`] - In-memory store implementing every port

pub mod engine;
pub mod guard;
pub mod memory;

pub use engine::{CheckoutConfig, CheckoutEngine};
pub use guard::CompensationGuard;
pub use memory::MemoryStore;
