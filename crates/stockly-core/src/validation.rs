//! # Validation Module
//!
//! Input validation utilities for Stockly.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Dashboard forms (TypeScript)                                 │
//! │  ├── Required fields, number inputs                                    │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler / repository (Rust)                             │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK (stock >= 0) constraints                         │
//! │  └── Foreign key invoice_items → invoices                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockly_core::validation::{validate_sku, validate_quantity};
//!
//! validate_sku("WM-001").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::{InvoiceStatus, InvoiceUpdate, NewInvoice, NewProduct, ProductUpdate};
use crate::MAX_LINE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - Must be between 1 and 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use stockly_core::validation::validate_sku;
///
/// assert!(validate_sku("KB-002").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name (1–200 characters after trimming).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required_text("name", name, 200)
}

/// Validates a customer name (1–200 characters after trimming).
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    required_text("customer_name", name, 200)
}

/// Validates an optional email address.
///
/// Blank is allowed; anything else needs one `@` with text on both sides and
/// a dot in the domain.
///
/// ## Example
/// ```rust
/// use stockly_core::validation::validate_email;
///
/// assert!(validate_email("").is_ok());
/// assert!(validate_email("ada@example.com").is_ok());
/// assert!(validate_email("ada@localhost").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Ok(());
    }

    let invalid = || ValidationError::InvalidFormat {
        field: "customer_email".to_string(),
        reason: "must be a valid email address".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || email.contains(char::is_whitespace) {
        return Err(invalid());
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}

fn required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (9999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Invoice form: line item                                                │
/// │                                                                         │
/// │  User enters quantity: 5                                               │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       │                                                                 │
/// │       ├── qty > 9999? → Error: "quantity must be between 1 and 9999"   │
/// │       │                                                                 │
/// │       └── OK → stock check                                             │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price: finite and not negative. Zero is allowed (free items).
///
/// ## Example
/// ```rust
/// use stockly_core::validation::validate_price;
///
/// assert!(validate_price(10.99).is_ok());
/// assert!(validate_price(0.0).is_ok());
/// assert!(validate_price(-1.0).is_err());
/// assert!(validate_price(f64::NAN).is_err());
/// ```
pub fn validate_price(price: f64) -> ValidationResult<()> {
    if !price.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: "must be a number".to_string(),
        });
    }

    if price < 0.0 {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a stored product discount percentage (0–100).
///
/// Product discounts are rejected when out of range rather than clamped;
/// only invoice-level percentages are coerced.
pub fn validate_discount(field: &str, pct: f64) -> ValidationResult<()> {
    if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

/// Validates a stock level or threshold (>= 0).
pub fn validate_stock(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================

/// Validates all fields of a new product.
pub fn validate_new_product(input: &NewProduct) -> ValidationResult<()> {
    validate_product_name(&input.name)?;
    validate_sku(&input.sku)?;
    validate_price(input.price)?;
    validate_discount("discount", input.discount)?;
    validate_stock("stock", input.stock)?;
    validate_stock("min_stock", input.min_stock)?;
    Ok(())
}

/// Validates the fields present in a product update.
pub fn validate_product_update(update: &ProductUpdate) -> ValidationResult<()> {
    if let Some(name) = &update.name {
        validate_product_name(name)?;
    }
    if let Some(sku) = &update.sku {
        validate_sku(sku)?;
    }
    if let Some(price) = update.price {
        validate_price(price)?;
    }
    if let Some(discount) = update.discount {
        validate_discount("discount", discount)?;
    }
    if let Some(stock) = update.stock {
        validate_stock("stock", stock)?;
    }
    if let Some(min_stock) = update.min_stock {
        validate_stock("min_stock", min_stock)?;
    }
    Ok(())
}

/// Validates the customer fields and starting status of a new invoice.
///
/// An invoice starts as draft or paid; it can only be cancelled later.
/// Line items are checked by the reservation check, not here.
pub fn validate_new_invoice(input: &NewInvoice) -> ValidationResult<()> {
    validate_customer_name(&input.customer_name)?;
    validate_email(&input.customer_email)?;
    if input.status == InvoiceStatus::Cancelled {
        return Err(ValidationError::NotAllowed {
            field: "status".to_string(),
            allowed: vec![InvoiceStatus::Draft.to_string(), InvoiceStatus::Paid.to_string()],
        });
    }
    Ok(())
}

/// Validates the customer fields present in an invoice update.
pub fn validate_invoice_update(update: &InvoiceUpdate) -> ValidationResult<()> {
    if let Some(name) = &update.customer_name {
        validate_customer_name(name)?;
    }
    if let Some(email) = &update.customer_email {
        validate_email(email)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
