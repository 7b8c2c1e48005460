//! # Error Types
//!
//! Domain-specific error types for shopkeep-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shopkeep-core errors (this file)                                      │
//! │  ├── CoreError        - Checkout domain errors                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  shopkeep-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  HTTP errors (in apps/shopkeep-api)                                    │
//! │  └── ApiError         - What storefront clients see (serialized)       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ← DbError; CoreError → ApiError     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Taxonomy
//! Every `CoreError` falls into exactly one [`ErrorKind`]:
//!
//! | Kind         | Variants                                      | HTTP |
//! |--------------|-----------------------------------------------|------|
//! | Input        | Validation                                    | 400  |
//! | NotFound     | ProductNotFound, InventoryNotFound, EmptyCart | 404  |
//! | Conflict     | InsufficientStock, CartChanged                | 409  |
//! | Unauthorized | Unauthorized                                  | 401  |
//! | Internal     | Storage, AmountOverflow, Timeout              | 500  |
//!
//! Only `Internal` is worth an infrastructure-level retry. The engine itself
//! never retries anything.

use thiserror::Error;

use crate::types::{ActorId, ProductId};

// =============================================================================
// Core Error
// =============================================================================

/// Checkout domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Product is not in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Product exists but has no inventory record.
    #[error("No inventory record for product {0}")]
    InventoryNotFound(ProductId),

    /// Not enough stock to reserve the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// POST /purchase/2 { quantity: 1000 }
    ///      │
    ///      ▼
    /// reserve(P2, 1000): stock=30
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: 2, available: 30, requested: 1000 }
    ///      │
    ///      ▼
    /// 409 { availableQuantity: 30 }
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: ProductId,
        available: i64,
        requested: i64,
    },

    /// Actor has no cart or the cart holds no items.
    #[error("Cart is empty for actor {0}")]
    EmptyCart(ActorId),

    /// No authenticated actor on the request.
    #[error("Unauthorized")]
    Unauthorized,

    /// A line or purchase total does not fit in an i64 cent count.
    #[error("Amount overflow{}", .product_id.map(|id| format!(" for product {id}")).unwrap_or_default())]
    AmountOverflow { product_id: Option<ProductId> },

    /// The cart no longer holds the lines being purchased, e.g. a
    /// concurrent checkout of the same cart committed first.
    #[error("Cart changed during checkout for actor {0}")]
    CartChanged(ActorId),

    /// Underlying store failed (connection, query, transaction).
    #[error("Storage error: {0}")]
    Storage(String),

    /// The checkout attempt exceeded its deadline.
    #[error("Checkout timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },
}

/// Error category used to pick a response and decide on retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed request; the caller's fault.
    Input,
    /// Missing product, inventory record, cart or purchase.
    NotFound,
    /// Legitimate business state, e.g. insufficient stock.
    Conflict,
    /// No actor identity.
    Unauthorized,
    /// Storage or infrastructure failure.
    Internal,
}

impl ErrorKind {
    /// Whether an infrastructure-level retry could help.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Internal)
    }
}

impl CoreError {
    /// Maps the error onto the checkout taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) => ErrorKind::Input,
            CoreError::ProductNotFound(_)
            | CoreError::InventoryNotFound(_)
            | CoreError::EmptyCart(_) => ErrorKind::NotFound,
            CoreError::InsufficientStock { .. } | CoreError::CartChanged(_) => {
                ErrorKind::Conflict
            }
            CoreError::Unauthorized => ErrorKind::Unauthorized,
            CoreError::AmountOverflow { .. } | CoreError::Storage(_) | CoreError::Timeout { .. } => {
                ErrorKind::Internal
            }
        }
    }

    /// The product this error is about, when there is one.
    pub fn product_id(&self) -> Option<ProductId> {
        match self {
            CoreError::ProductNotFound(id) | CoreError::InventoryNotFound(id) => Some(*id),
            CoreError::InsufficientStock { product_id, .. } => Some(*product_id),
            CoreError::AmountOverflow { product_id } => *product_id,
            _ => None,
        }
    }

    /// Current availability for conflict errors.
    pub fn available_quantity(&self) -> Option<i64> {
        match self {
            CoreError::InsufficientStock { available, .. } => Some(*available),
            _ => None,
        }
    }

    /// Shorthand for storage failures raised by adapters.
    pub fn storage(message: impl Into<String>) -> Self {
        CoreError::Storage(message.into())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before anything is reserved, so they never need compensation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be a positive integer")]
    MustBePositive { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: ProductId(2),
            available: 30,
            requested: 1000,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product 2: available 30, requested 1000"
        );

        let err = CoreError::AmountOverflow {
            product_id: Some(ProductId(4)),
        };
        assert_eq!(err.to_string(), "Amount overflow for product 4");
        assert_eq!(
            CoreError::AmountOverflow { product_id: None }.to_string(),
            "Amount overflow"
        );
    }

    #[test]
    fn test_kinds() {
        let input: CoreError = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into();
        assert_eq!(input.kind(), ErrorKind::Input);
        assert_eq!(CoreError::ProductNotFound(ProductId(1)).kind(), ErrorKind::NotFound);
        assert_eq!(CoreError::EmptyCart(ActorId(1)).kind(), ErrorKind::NotFound);
        assert_eq!(CoreError::Unauthorized.kind(), ErrorKind::Unauthorized);
        assert_eq!(CoreError::Timeout { after_ms: 10 }.kind(), ErrorKind::Internal);

        let conflict = CoreError::InsufficientStock {
            product_id: ProductId(2),
            available: 30,
            requested: 1000,
        };
        assert_eq!(conflict.kind(), ErrorKind::Conflict);
        assert!(!conflict.kind().is_retryable());
        assert_eq!(CoreError::CartChanged(ActorId(1)).kind(), ErrorKind::Conflict);
        assert!(CoreError::storage("disk full").kind().is_retryable());
    }

    #[test]
    fn test_error_reports_failing_product() {
        let err = CoreError::InsufficientStock {
            product_id: ProductId(2),
            available: 30,
            requested: 1000,
        };
        assert_eq!(err.product_id(), Some(ProductId(2)));
        assert_eq!(err.available_quantity(), Some(30));

        let err = CoreError::InventoryNotFound(ProductId(5));
        assert_eq!(err.product_id(), Some(ProductId(5)));
        assert_eq!(err.available_quantity(), None);
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be a positive integer");
    }
}
