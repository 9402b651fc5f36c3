//! # Stock Reservation Check
//!
//! Decides whether an invoice may be committed against current stock and,
//! if so, which stock decrements to apply.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   NewInvoice.items ──► check_reservation(items, products)               │
//! │                              │                                          │
//! │              ┌───────────────┴──────────────┐                           │
//! │              ▼                              ▼                           │
//! │         Err(CoreError)              Ok(ReservationPlan)                 │
//! │      nothing is written           lines + per-product deltas            │
//! │                                             │                           │
//! │                                             ▼                           │
//! │                          store transaction (stockly-db):                │
//! │                          UPDATE stock = stock - q                       │
//! │                           WHERE id = ? AND stock >= q                   │
//! │                          0 rows ⇒ rollback, InsufficientStock           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The plan is computed from a snapshot that may be stale by the time the
//! store applies it; the conditional decrement is what keeps stock from
//! going negative.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::money::Percentage;
use crate::pricing::{snapshot_line, totals_for_items, InvoiceTotals};
use crate::types::{InvoiceLineItem, LineItemInput, Product};
use crate::validation::validate_quantity;
use crate::MAX_INVOICE_LINES;

// =============================================================================
// Plan Types
// =============================================================================

/// One accepted line: the product as it was when checked, and the quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedLine {
    pub product: Product,
    pub quantity: i64,
}

/// Combined decrement for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDelta {
    pub product_id: String,
    pub name: String,
    /// Units to take off across all lines for this product.
    pub quantity: i64,
    /// Stock seen by the check.
    pub available: i64,
}

impl StockDelta {
    /// Stock left once the decrement is applied to the checked snapshot.
    pub fn remaining(&self) -> i64 {
        self.available - self.quantity
    }
}

/// An accepted reservation, ready for the store to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationPlan {
    /// Lines in input order.
    pub lines: Vec<PlannedLine>,
    /// One delta per distinct product, in order of first appearance.
    pub deltas: Vec<StockDelta>,
}

impl ReservationPlan {
    /// Snapshots every line for `invoice_id`.
    pub fn line_items(&self, invoice_id: &str) -> Vec<InvoiceLineItem> {
        self.lines
            .iter()
            .map(|l| snapshot_line(&l.product, invoice_id, l.quantity))
            .collect()
    }

    /// Invoice totals for the planned lines.
    pub fn totals(&self, discount_percent: Percentage, tax_percent: Percentage) -> InvoiceTotals {
        totals_for_items(&self.line_items(""), discount_percent, tax_percent)
    }
}

// =============================================================================
// Check
// =============================================================================

/// Rejects line lists longer than [`MAX_INVOICE_LINES`].
///
/// Runs before any product lookup, so an oversized request never reaches
/// the store.
pub fn check_line_limit(lines: &[LineItemInput]) -> CoreResult<()> {
    if lines.len() > MAX_INVOICE_LINES {
        return Err(CoreError::TooManyLines {
            max: MAX_INVOICE_LINES,
        });
    }
    Ok(())
}

/// Validates `lines` against the owner's `products`.
///
/// ## Rejections (in the order they are checked)
/// 1. no lines → [`CoreError::EmptyInvoice`]
/// 2. more than [`MAX_INVOICE_LINES`] → [`CoreError::TooManyLines`]
/// 3. a line with no product chosen → [`CoreError::MissingProductSelection`]
/// 4. quantity not in 1..=MAX_LINE_QUANTITY → [`CoreError::Validation`]
/// 5. unknown product → [`CoreError::ProductNotFound`]
/// 6. combined quantity for a product above its stock → [`CoreError::InsufficientStock`]
///
/// ## Example
/// ```rust
/// # use stockly_core::{LineItemInput, Product};
/// # use stockly_core::reservation::check_reservation;
/// # fn product(stock: i64) -> Product {
/// #     Product { id: "p".into(), user_id: "u".into(), name: "Mouse".into(),
/// #         sku: "WM-001".into(), category: String::new(), description: String::new(),
/// #         price: 29.99, discount: 0.0, stock, min_stock: 0, image_url: None,
/// #         created_at: chrono::Utc::now(), updated_at: chrono::Utc::now() }
/// # }
/// let stock = [product(5)];
/// assert!(check_reservation(&[LineItemInput::new("p", 6)], &stock).is_err());
///
/// let plan = check_reservation(&[LineItemInput::new("p", 5)], &stock).unwrap();
/// assert_eq!(plan.deltas[0].remaining(), 0);
/// ```
pub fn check_reservation(
    lines: &[LineItemInput],
    products: &[Product],
) -> CoreResult<ReservationPlan> {
    if lines.is_empty() {
        return Err(CoreError::EmptyInvoice);
    }
    check_line_limit(lines)?;

    let by_id: HashMap<&str, &Product> = products.iter().map(|p| (p.id.as_str(), p)).collect();

    // Selection first, over every line, so the form can point at the blank row
    let mut selected = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        let product_id = line
            .product_id()
            .ok_or(CoreError::MissingProductSelection { line: index + 1 })?;
        selected.push((product_id, line.quantity));
    }

    let mut planned = Vec::with_capacity(selected.len());
    let mut deltas: Vec<StockDelta> = Vec::new();
    let mut delta_index: HashMap<&str, usize> = HashMap::new();

    for (product_id, quantity) in selected {
        validate_quantity(quantity)?;
        let product = by_id
            .get(product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        match delta_index.get(product_id) {
            Some(&i) => deltas[i].quantity += quantity,
            None => {
                delta_index.insert(product_id, deltas.len());
                deltas.push(StockDelta {
                    product_id: product.id.clone(),
                    name: product.name.clone(),
                    quantity,
                    available: product.stock,
                });
            }
        }

        planned.push(PlannedLine {
            product: (*product).clone(),
            quantity,
        });
    }

    if let Some(short) = deltas.iter().find(|d| d.quantity > d.available) {
        return Err(CoreError::InsufficientStock {
            product_id: short.product_id.clone(),
            name: short.name.clone(),
            available: short.available,
            requested: short.quantity,
        });
    }

    Ok(ReservationPlan {
        lines: planned,
        deltas,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use chrono::Utc;

    fn product(id: &str, stock: i64) -> Product {
        Product {
            id: id.into(),
            user_id: "u-1".into(),
            name: format!("Product {id}"),
            sku: format!("SKU-{id}"),
            category: String::new(),
            description: String::new(),
            price: 30.0,
            discount: 0.0,
            stock,
            min_stock: 0,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_stock_five_rejects_six() {
        let products = [product("a", 5)];
        let err = check_reservation(&[LineItemInput::new("a", 6)], &products).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientStock {
                product_id: "a".into(),
                name: "Product a".into(),
                available: 5,
                requested: 6,
            }
        );
        // The snapshot itself is never touched
        assert_eq!(products[0].stock, 5);
    }

    #[test]
    fn test_stock_five_accepts_five() {
        let products = [product("a", 5)];
        let plan = check_reservation(&[LineItemInput::new("a", 5)], &products).unwrap();
        assert_eq!(plan.deltas.len(), 1);
        assert_eq!(plan.deltas[0].quantity, 5);
        assert_eq!(plan.deltas[0].remaining(), 0);
    }

    #[test]
    fn test_empty_invoice() {
        assert_eq!(
            check_reservation(&[], &[product("a", 5)]).unwrap_err(),
            CoreError::EmptyInvoice
        );
    }

    #[test]
    fn test_missing_selection_reports_line() {
        let lines = [LineItemInput::new("a", 1), LineItemInput::default()];
        assert_eq!(
            check_reservation(&lines, &[product("a", 5)]).unwrap_err(),
            CoreError::MissingProductSelection { line: 2 }
        );
    }

    #[test]
    fn test_unknown_product() {
        assert_eq!(
            check_reservation(&[LineItemInput::new("ghost", 1)], &[product("a", 5)]).unwrap_err(),
            CoreError::ProductNotFound("ghost".into())
        );
    }

    #[test]
    fn test_non_positive_quantity() {
        let err = check_reservation(&[LineItemInput::new("a", 0)], &[product("a", 5)]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_combined_demand_across_lines() {
        let products = [product("a", 5), product("b", 10)];
        let lines = [
            LineItemInput::new("a", 3),
            LineItemInput::new("b", 1),
            LineItemInput::new("a", 3),
        ];
        let err = check_reservation(&lines, &products).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { requested: 6, available: 5, .. }
        ));

        let lines = [LineItemInput::new("a", 2), LineItemInput::new("a", 3)];
        let plan = check_reservation(&lines, &products).unwrap();
        assert_eq!(plan.lines.len(), 2);
        assert_eq!(plan.deltas.len(), 1);
        assert_eq!(plan.deltas[0].quantity, 5);
    }

    #[test]
    fn test_too_many_lines() {
        let lines = vec![LineItemInput::new("a", 1); MAX_INVOICE_LINES + 1];
        assert_eq!(
            check_reservation(&lines, &[product("a", 1_000)]).unwrap_err(),
            CoreError::TooManyLines {
                max: MAX_INVOICE_LINES
            }
        );

        let at_limit = vec![LineItemInput::default(); MAX_INVOICE_LINES];
        assert!(check_line_limit(&at_limit).is_ok());
        assert!(check_line_limit(&[]).is_ok());
    }

    #[test]
    fn test_plan_line_items_and_totals() {
        let products = [product("a", 10)];
        let plan = check_reservation(&[LineItemInput::new("a", 3)], &products).unwrap();

        let items = plan.line_items("inv-1");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].invoice_id, "inv-1");
        assert_eq!(items[0].total, 90.0);

        let totals = plan.totals(Percentage::zero(), Percentage::sanitize(10.0));
        assert!((totals.total.amount() - 99.0).abs() < 1e-9);
    }
}
