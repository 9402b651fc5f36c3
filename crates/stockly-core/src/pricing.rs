//! # Pricing Engine
//!
//! Line totals and invoice totals. Stateless and pure.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Invoice Totals                                    │
//! │                                                                         │
//! │  per line:   unit  = price - price × discount / 100                     │
//! │              total = unit × quantity                                    │
//! │                                                                         │
//! │  invoice:    subtotal = Σ line totals                                   │
//! │              discount = subtotal × discount% / 100                      │
//! │              taxable  = subtotal - discount                             │
//! │              tax      = taxable × tax% / 100                            │
//! │              total    = taxable + tax                                   │
//! │                                                                         │
//! │  Percentages pass through Percentage::sanitize first: a blank or        │
//! │  garbled form field becomes 0, never NaN in a stored total.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Percentage};
use crate::reservation::check_line_limit;
use crate::types::{InvoiceLineItem, LineItemInput, Product};
use crate::validation::validate_quantity;

// =============================================================================
// Line Pricing
// =============================================================================

/// Unit price after the product discount.
///
/// ## Example
/// ```rust
/// use stockly_core::money::{Money, Percentage};
/// use stockly_core::pricing::final_unit_price;
///
/// let unit = final_unit_price(Money::new(89.99), Percentage::sanitize(10.0));
/// assert_eq!(unit.to_string(), "$80.99");
/// ```
#[inline]
pub fn final_unit_price(price: Money, discount: Percentage) -> Money {
    price.apply_discount(discount)
}

/// Total of one line: discounted unit price × quantity. Not rounded.
#[inline]
pub fn line_total(price: Money, discount: Percentage, quantity: i64) -> Money {
    final_unit_price(price, discount) * quantity
}

/// Freezes a product's name, SKU, price and discount into a line item.
pub fn snapshot_line(product: &Product, invoice_id: &str, quantity: i64) -> InvoiceLineItem {
    let total = line_total(product.unit_price(), product.discount_rate(), quantity);
    InvoiceLineItem {
        id: Uuid::new_v4().to_string(),
        invoice_id: invoice_id.to_string(),
        inventory_item_id: product.id.clone(),
        name: product.name.clone(),
        sku: product.sku.clone(),
        price: product.price,
        discount: product.discount_rate().value(),
        quantity,
        total: total.amount(),
    }
}

// =============================================================================
// Invoice Totals
// =============================================================================

/// The derived amounts of an invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceTotals {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub taxable_amount: Money,
    pub tax_amount: Money,
    pub total: Money,
}

/// Computes invoice totals from line totals and invoice-level percentages.
///
/// Raw `f64` percentages are accepted and sanitized; line order does not
/// matter and an empty list gives all zeros.
///
/// ## Example
/// ```rust
/// use stockly_core::money::Money;
/// use stockly_core::pricing::compute_totals;
///
/// let totals = compute_totals([Money::new(180.0)], 5.0, f64::NAN);
/// assert_eq!(totals.discount_amount.amount(), 9.0);
/// assert!(totals.tax_amount.is_zero());
/// ```
pub fn compute_totals<I>(
    line_totals: I,
    discount_percent: impl Into<Percentage>,
    tax_percent: impl Into<Percentage>,
) -> InvoiceTotals
where
    I: IntoIterator<Item = Money>,
{
    let subtotal: Money = line_totals.into_iter().sum();
    let discount_amount = subtotal.percent_of(discount_percent.into());
    let taxable_amount = subtotal - discount_amount;
    let tax_amount = taxable_amount.percent_of(tax_percent.into());

    InvoiceTotals {
        subtotal,
        discount_amount,
        taxable_amount,
        tax_amount,
        total: taxable_amount + tax_amount,
    }
}

/// Totals over already-snapshotted line items.
pub fn totals_for_items(
    items: &[InvoiceLineItem],
    discount_percent: Percentage,
    tax_percent: Percentage,
) -> InvoiceTotals {
    compute_totals(
        items.iter().map(InvoiceLineItem::line_total),
        discount_percent,
        tax_percent,
    )
}

// =============================================================================
// Quote
// =============================================================================

/// A priced line of a draft invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuoteLine {
    pub inventory_item_id: String,
    pub name: String,
    pub sku: String,
    pub price: Money,
    pub discount: Percentage,
    pub unit_price: Money,
    pub quantity: i64,
    pub total: Money,
    /// Stock on hand when quoted; the commit re-checks it.
    pub available: i64,
}

/// Display-time pricing of a draft invoice. Nothing is reserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Quote {
    pub lines: Vec<QuoteLine>,
    pub totals: InvoiceTotals,
}

/// Prices the lines of an invoice form against the owner's products.
///
/// Lines with no product chosen yet are skipped (the form shows them with
/// no total). Stock is reported but not enforced here.
///
/// ## Errors
/// - [`CoreError::ProductNotFound`] when a chosen product is not in `products`
/// - [`CoreError::Validation`] for a non-positive or oversized quantity
/// - [`CoreError::TooManyLines`] past [`crate::MAX_INVOICE_LINES`] lines
pub fn quote(
    lines: &[LineItemInput],
    products: &[Product],
    discount_percent: Percentage,
    tax_percent: Percentage,
) -> CoreResult<Quote> {
    check_line_limit(lines)?;
    let by_id: HashMap<&str, &Product> = products.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut priced = Vec::with_capacity(lines.len());
    for line in lines {
        let Some(product_id) = line.product_id() else {
            continue;
        };
        let product = by_id
            .get(product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;
        validate_quantity(line.quantity)?;

        let price = product.unit_price();
        let discount = product.discount_rate();
        priced.push(QuoteLine {
            inventory_item_id: product.id.clone(),
            name: product.name.clone(),
            sku: product.sku.clone(),
            price,
            discount,
            unit_price: final_unit_price(price, discount),
            quantity: line.quantity,
            total: line_total(price, discount, line.quantity),
            available: product.stock,
        });
    }

    let totals = compute_totals(priced.iter().map(|l| l.total), discount_percent, tax_percent);
    Ok(Quote {
        lines: priced,
        totals,
    })
}

// =============================================================================
// Lenient Percentage Input
// =============================================================================

/// `deserialize_with` helper for percentage form fields.
///
/// | JSON            | Result          |
/// |-----------------|-----------------|
/// | `8`, `8.5`      | 8, 8.5          |
/// | `"8"`, `" 8 "`  | 8               |
/// | `"abc"`, `""`   | 0               |
/// | `null`, `true`  | 0               |
///
/// Combine with `#[serde(default)]` so a missing field is 0 as well.
pub fn lenient_percentage<'de, D>(deserializer: D) -> Result<Percentage, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let number = match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(Percentage::from_input(number))
}

// =============================================================================
// Unit Tests
// =============================================================================
