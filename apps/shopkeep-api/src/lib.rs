//! # Shopkeep API
//!
//! HTTP surface of the checkout engine.
//!
//! ## Routes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /purchase/:productId  ──► CheckoutEngine::purchase_item          │
//! │  POST /purchase/            ──► CheckoutEngine::purchase_cart          │
//! │  GET  /health               ──► Database::health_check                 │
//! │                                                                         │
//! │  Purchase routes require `Authorization: Bearer <jwt>`; the token's    │
//! │  `id` claim is the acting user.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `SHOPKEEP_PORT` - HTTP port (default: 3000)
//! - `SHOPKEEP_DB_PATH` - SQLite file (default: ./shopkeep.db)
//! - `SHOPKEEP_DB_MAX_CONNECTIONS` - pool size (default: 5)
//! - `JWT_SECRET` - HMAC secret shared with the auth service
//! - `SHOPKEEP_CHECKOUT_TIMEOUT_MS` - attempt deadline, 0 disables (default: 10000)
//! - `SHOPKEEP_SEED` - load the sample catalog into an empty database
//! - `RUST_LOG` - log filter

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use shopkeep_checkout::CheckoutEngine;
use shopkeep_db::Database;

pub use auth::JwtVerifier;
pub use config::ApiConfig;
pub use error::ApiError;
pub use routes::router;

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub engine: CheckoutEngine,
    pub jwt: JwtVerifier,
}

impl AppState {
    /// Wires the checkout engine to the SQLite repositories.
    pub fn new(db: Database, config: &ApiConfig) -> Self {
        let engine = CheckoutEngine::new(
            Arc::new(db.catalog()),
            Arc::new(db.inventory()),
            Arc::new(db.carts()),
            Arc::new(db.purchases()),
        )
        .with_config(config.checkout_config());

        AppState {
            db,
            engine,
            jwt: JwtVerifier::new(&config.jwt_secret),
        }
    }
}
