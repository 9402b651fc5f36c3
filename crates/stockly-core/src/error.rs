//! # Error Types
//!
//! Domain-specific error types for stockly-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockly-core errors (this file)                                       │
//! │  ├── CoreError        - Domain rejections (stock, empty invoice, ...)  │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockly-db errors (separate crate)                                    │
//! │  └── DbError          - Database / blob store failures                 │
//! │                                                                         │
//! │  HTTP errors (in server)                                               │
//! │  └── ApiError         - What the dashboard sees (JSON)                 │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `CoreError` is always a rejection with no partial effect: nothing has
//! been written when one is returned.

use crate::types::InvoiceStatus;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A line item references a product that does not exist (or belongs to
    /// another owner).
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Requested quantity exceeds the product's current stock.
    ///
    /// ## When This Occurs
    /// - A single line asks for more than is on hand
    /// - Several lines for the same product add up to more than is on hand
    /// - Another invoice took the stock between quote and commit
    ///
    /// ## User Workflow
    /// ```text
    /// Invoice form: Webcam HD × 6
    ///      │
    ///      ▼
    /// Check stock: available=5
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Webcam HD", available: 5, requested: 6 }
    ///      │
    ///      ▼
    /// UI shows: "Insufficient stock for Webcam HD"
    /// ```
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// An invoice must carry at least one line item.
    #[error("Please add at least one item to the invoice")]
    EmptyInvoice,

    /// A line item was submitted without choosing a product.
    #[error("Please select a product for all line items (line {line})")]
    MissingProductSelection { line: usize },

    /// Invoice not found.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Status change outside draft → paid, draft → cancelled, paid → cancelled.
    #[error("Invoice cannot move from {from} to {to}")]
    InvalidStatusTransition {
        from: InvoiceStatus,
        to: InvoiceStatus,
    },

    /// Invoice has more line items than allowed.
    #[error("Invoice cannot have more than {max} line items")]
    TooManyLines { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Error)]
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
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
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
            product_id: "p-1".to_string(),
            name: "Webcam HD".to_string(),
            available: 5,
            requested: 6,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Webcam HD: available 5, requested 6"
        );

        let err = CoreError::InvalidStatusTransition {
            from: InvoiceStatus::Cancelled,
            to: InvoiceStatus::Paid,
        };
        assert_eq!(err.to_string(), "Invoice cannot move from cancelled to paid");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "sku".to_string(),
        };
        assert_eq!(err.to_string(), "sku is required");

        let err = ValidationError::Negative {
            field: "stock".to_string(),
        };
        assert_eq!(err.to_string(), "stock cannot be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "sku".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
