//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! CheckoutEngine ── CoreError ──► ApiError ──► status + JSON body
//!
//!   kind()        status   error code
//!   ─────────     ──────   ────────────────────
//!   Input          400     validation_error
//!   NotFound       404     not_found
//!   Conflict       409     insufficient_stock  (+ availableQuantity)
//!                          cart_conflict       (cart changed mid-checkout)
//!   Unauthorized   401     unauthorized
//!   Internal       500     internal_error      (details logged, not sent)
//! ```
//!
//! ## Body
//! ```json
//! { "error": "insufficient_stock",
//!   "message": "Requested quantity not available",
//!   "productId": 2,
//!   "availableQuantity": 30 }
//! ```
//! `productId` is present whenever the error names a product.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use shopkeep_core::{CoreError, ErrorKind};

/// API error returned from handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,

    /// Machine-readable error code
    pub code: &'static str,

    /// Human-readable error message
    pub message: String,

    /// Product the failure is about, if any
    pub product_id: Option<i64>,

    /// Current stock, on insufficient-stock conflicts
    pub available_quantity: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    product_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    available_quantity: Option<i64>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
            product_id: None,
            available_quantity: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    /// Logs the detail and returns a generic 500.
    pub fn internal(detail: impl Into<String>) -> Self {
        let detail: String = detail.into();
        error!(%detail, "Internal error");
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal server error",
        )
    }
}

/// Converts checkout errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let api = match err.kind() {
            ErrorKind::Input => ApiError::validation(err.to_string()),
            ErrorKind::NotFound => ApiError::new(StatusCode::NOT_FOUND, "not_found", err.to_string()),
            ErrorKind::Conflict => match err.available_quantity() {
                Some(available) => ApiError {
                    available_quantity: Some(available),
                    ..ApiError::new(
                        StatusCode::CONFLICT,
                        "insufficient_stock",
                        "Requested quantity not available",
                    )
                },
                None => ApiError::new(
                    StatusCode::CONFLICT,
                    "cart_conflict",
                    "Cart changed during checkout, please retry",
                ),
            },
            ErrorKind::Unauthorized => ApiError::unauthorized(err.to_string()),
            ErrorKind::Internal => ApiError::internal(err.to_string()),
        };

        ApiError {
            product_id: err.product_id().map(|id| id.get()),
            ..api
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code,
            message: &self.message,
            product_id: self.product_id,
            available_quantity: self.available_quantity,
        };
        (self.status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use shopkeep_core::{ActorId, ProductId, ValidationError};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                CoreError::Validation(ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (CoreError::ProductNotFound(ProductId(9)), StatusCode::NOT_FOUND),
            (CoreError::InventoryNotFound(ProductId(9)), StatusCode::NOT_FOUND),
            (CoreError::EmptyCart(ActorId(1)), StatusCode::NOT_FOUND),
            (CoreError::Unauthorized, StatusCode::UNAUTHORIZED),
            (CoreError::storage("locked"), StatusCode::INTERNAL_SERVER_ERROR),
            (
                CoreError::Timeout { after_ms: 10 },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_conflict_carries_available_quantity() {
        let err = ApiError::from(CoreError::InsufficientStock {
            product_id: ProductId(2),
            available: 30,
            requested: 1000,
        });

        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "insufficient_stock");
        assert_eq!(err.product_id, Some(2));
        assert_eq!(err.available_quantity, Some(30));
    }

    #[test]
    fn test_cart_changed_is_a_conflict_without_stock() {
        let err = ApiError::from(CoreError::CartChanged(ActorId(1)));

        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "cart_conflict");
        assert_eq!(err.product_id, None);
        assert_eq!(err.available_quantity, None);
    }

    #[test]
    fn test_not_found_names_product() {
        let err = ApiError::from(CoreError::ProductNotFound(ProductId(99)));
        assert_eq!(err.product_id, Some(99));
    }

    #[test]
    fn test_internal_detail_hidden() {
        let err = ApiError::from(CoreError::storage("database is locked"));
        assert!(!err.message.contains("locked"));
    }
}
