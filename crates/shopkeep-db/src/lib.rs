//! # shopkeep-db: Database Layer for Shopkeep
//!
//! SQLite persistence for the checkout engine. Every collaborator trait
//! from `shopkeep-core` has a repository here that implements it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopkeep Data Flow                               │
//! │                                                                         │
//! │  CheckoutEngine (shopkeep-checkout)                                    │
//! │       │  ports                                                          │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   shopkeep-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌─────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories   │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                 │   │  (embedded)  │  │   │
//! │  │   │               │    │ CatalogRepo     │   │              │  │   │
//! │  │   │ SqlitePool    │◄───│ InventoryRepo   │   │ 001_initial  │  │   │
//! │  │   │               │    │ CartRepo        │   │ _schema.sql  │  │   │
//! │  │   │               │    │ PurchaseRepo    │   │              │  │   │
//! │  │   └───────────────┘    └─────────────────┘   └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL mode)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`seed`] - Sample catalog, stock and carts
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopkeep_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./shopkeep.db")).await?;
//! let stock = db.inventory().stock(ProductId(1)).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod seed;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::cart::CartRepository;
pub use repository::inventory::{InventoryRepository, ReserveOutcome};
pub use repository::product::CatalogRepository;
pub use repository::purchase::PurchaseRepository;
