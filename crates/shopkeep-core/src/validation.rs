//! # Validation Module
//!
//! Input validation for checkout requests and inventory provisioning.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractor (axum)                                        │
//! │  ├── Path/body deserialization                                         │
//! │  └── Bearer token present                                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Checkout Engine                                              │
//! │  └── THIS MODULE: quantity, stock levels, catalog entries              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0)                                                │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopkeep_core::validation::validate_quantity;
//!
//! assert!(validate_quantity(1).is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a requested purchase quantity.
///
/// ## Rules
/// - Must be positive (> 0)
///
/// No upper bound: asking for more than is in stock is a conflict reported
/// with the available quantity, not bad input.
///
/// ## User Workflow
/// ```text
/// POST /purchase/2 { quantity: q }
///      │
///      ▼
/// validate_quantity(q) ← THIS FUNCTION
///      │
///      ├── q <= 0? → 400 "quantity must be a positive integer"
///      │
///      └── OK → catalog lookup, reserve
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates an absolute stock level set by provisioning or restock.
///
/// ## Example
/// ```rust
/// use shopkeep_core::validation::validate_stock_level;
///
/// assert!(validate_stock_level(0).is_ok());
/// assert!(validate_stock_level(-1).is_err());
/// ```
pub fn validate_stock_level(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product title.
///
/// ## Rules
/// - Must not be blank
/// - At most 200 characters
pub fn validate_product_title(title: &str) -> ValidationResult<()> {
    let title = title.trim();

    if title.is_empty() {
        return Err(ValidationError::Required {
            field: "title".to_string(),
        });
    }

    if title.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: 200,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(1000).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }

    #[test]
    fn test_validate_stock_level() {
        assert!(validate_stock_level(0).is_ok());
        assert!(validate_stock_level(50).is_ok());
        assert!(validate_stock_level(-1).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(29999).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_product_title() {
        assert!(validate_product_title("JavaScript Book").is_ok());
        assert!(validate_product_title("   ").is_err());
        assert!(validate_product_title(&"A".repeat(201)).is_err());
    }
}
