//! # Domain Types
//!
//! Core domain types used throughout Stockly.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │    Product      │   │    Invoice      │   │  InvoiceLineItem    │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)          │   │
//! │  │  sku (business) │   │  invoice_number │   │  invoice_id (FK)    │   │
//! │  │  price          │   │  status         │   │  inventory_item_id  │   │
//! │  │  discount %     │   │  subtotal/total │   │  name/sku/price     │   │
//! │  │  stock          │   │  items ─────────┼──►│  (frozen snapshot)  │   │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │ InvoiceStatus   │   │   SalesData     │   │     Session         │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  Draft          │   │  per product    │   │  user_id            │   │
//! │  │  Paid           │   │  rollup of paid │   │  (owner of every    │   │
//! │  │  Cancelled      │   │  invoices       │   │   row it touches)   │   │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, the durable key
//! - Business ID: (sku, invoice_number) - human-readable, not unique for invoices
//!
//! ## Amounts
//! Stored amounts are plain `f64` columns in major units. Use the accessor
//! methods to get [`Money`] / [`Percentage`] values for arithmetic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::money::{Money, Percentage};
use crate::pricing::lenient_percentage;

// =============================================================================
// Session
// =============================================================================

/// The caller on whose behalf a store operation runs.
///
/// Every repository method takes one; rows are always filtered by
/// `user_id`, so one owner never sees another owner's products or invoices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Session {
    pub user_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Session {
            user_id: user_id.into(),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// An inventory item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owner of this product.
    pub user_id: String,

    /// Display name shown in the inventory table and on invoices.
    pub name: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    pub category: String,

    pub description: String,

    /// Base unit price in major units.
    pub price: f64,

    /// Product discount percentage (0-100).
    pub discount: f64,

    /// Units on hand. Never negative after a committed operation.
    pub stock: i64,

    /// Low-stock threshold (inclusive).
    pub min_stock: i64,

    /// Public URL of the product image, if one was uploaded.
    pub image_url: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the base price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::new(self.price)
    }

    /// Returns the product discount as a sanitized Percentage.
    #[inline]
    pub fn discount_rate(&self) -> Percentage {
        Percentage::sanitize(self.discount)
    }

    /// Whether stock has reached the low-stock threshold.
    ///
    /// ## Example
    /// ```text
    /// stock 10, min 10  → low
    /// stock 11, min 10  → fine
    /// ```
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub min_stock: i64,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Partial update of a product. `None` leaves a field unchanged.
///
/// `image_url: Some("")` clears the image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub discount: Option<f64>,
    pub stock: Option<i64>,
    pub min_stock: Option<i64>,
    pub image_url: Option<String>,
}

impl ProductUpdate {
    /// Returns true if nothing would change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.sku.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.discount.is_none()
            && self.stock.is_none()
            && self.min_stock.is_none()
            && self.image_url.is_none()
    }
}

// =============================================================================
// Invoice Status
// =============================================================================

/// The status of an invoice.
///
/// ## Allowed Transitions
/// ```text
///   Draft ──► Paid ──► Cancelled
///     │                   ▲
///     └───────────────────┘
/// ```
/// None of them touch stock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Created, not yet paid.
    #[default]
    Draft,
    /// Paid; counts towards revenue and sales analytics.
    Paid,
    /// Cancelled. Stock is not restored.
    Cancelled,
}

impl InvoiceStatus {
    /// Lowercase name, as stored and serialised.
    pub const fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    /// Whether an invoice in this status may move to `next`.
    ///
    /// Staying in the same status is always allowed (no-op).
    pub fn can_transition_to(&self, next: InvoiceStatus) -> bool {
        use InvoiceStatus::*;
        matches!(
            (self, next),
            (Draft, Draft)
                | (Paid, Paid)
                | (Cancelled, Cancelled)
                | (Draft, Paid)
                | (Draft, Cancelled)
                | (Paid, Cancelled)
        )
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(InvoiceStatus::Draft),
            "paid" => Ok(InvoiceStatus::Paid),
            "cancelled" => Ok(InvoiceStatus::Cancelled),
            _ => Err(crate::error::ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec!["draft".into(), "paid".into(), "cancelled".into()],
            }),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer pays. Recorded on the invoice, no payment is processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    /// Bakong KHQR code. Stored as a label only.
    Khqr,
    BankTransfer,
    Other,
}

impl PaymentMethod {
    /// Snake-case name, as stored and serialised.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Khqr => "khqr",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Other => "other",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// An invoice with its line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    pub user_id: String,

    /// Human-readable number (`INV-00001`). Display only, may repeat.
    pub invoice_number: String,

    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: Option<String>,
    pub notes: Option<String>,

    /// Sum of line totals.
    pub subtotal: f64,
    /// Tax amount (not a percentage).
    pub tax: f64,
    /// Invoice-level discount amount (not a percentage).
    pub discount: f64,
    pub total: f64,

    pub status: InvoiceStatus,

    pub payment_method: PaymentMethod,

    /// Line items in the order they were entered.
    pub items: Vec<InvoiceLineItem>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::new(self.total)
    }

    #[inline]
    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }
}

// =============================================================================
// Invoice Line Item
// =============================================================================

/// A line item on an invoice.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InvoiceLineItem {
    pub id: String,
    pub invoice_id: String,
    /// Product this line was sold from. Not enforced: the product may be gone.
    pub inventory_item_id: String,
    /// Product name at time of sale (frozen).
    pub name: String,
    /// SKU at time of sale (frozen).
    pub sku: String,
    /// Unit price at time of sale (frozen).
    pub price: f64,
    /// Product discount percentage at time of sale (frozen).
    pub discount: f64,
    pub quantity: i64,
    /// Discounted unit price × quantity.
    pub total: f64,
}

impl InvoiceLineItem {
    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::new(self.total)
    }
}

// =============================================================================
// Invoice Input
// =============================================================================

/// One line of an invoice being created.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineItemInput {
    /// `None` or blank when the user has not picked a product yet.
    #[serde(default)]
    pub inventory_item_id: Option<String>,
    pub quantity: i64,
}

impl LineItemInput {
    pub fn new(inventory_item_id: impl Into<String>, quantity: i64) -> Self {
        LineItemInput {
            inventory_item_id: Some(inventory_item_id.into()),
            quantity,
        }
    }

    /// The selected product id, ignoring blank selections.
    pub fn product_id(&self) -> Option<&str> {
        self.inventory_item_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Input for creating an invoice.
///
/// `discount_percent` and `tax_percent` come from free-text form fields;
/// anything that is not a number is read as 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewInvoice {
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub customer_address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItemInput>,
    #[serde(default, deserialize_with = "lenient_percentage")]
    pub discount_percent: Percentage,
    #[serde(default, deserialize_with = "lenient_percentage")]
    pub tax_percent: Percentage,
    /// Draft or paid. Cancelled invoices are rejected at creation.
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// Changes to an existing invoice. Line items are immutable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceUpdate {
    pub status: Option<InvoiceStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub notes: Option<String>,
}

impl InvoiceUpdate {
    /// Update that only changes the status.
    pub fn status(status: InvoiceStatus) -> Self {
        InvoiceUpdate {
            status: Some(status),
            ..Default::default()
        }
    }
}

// =============================================================================
// Analytics Outputs
// =============================================================================

/// Per-product rollup over paid invoices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesData {
    pub item_id: String,
    pub item_name: String,
    pub total_quantity: i64,
    pub total_revenue: f64,
    /// Number of distinct paid invoices the product appears on.
    pub invoice_count: i64,
}

/// Revenue of paid invoices on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RevenuePoint {
    /// Locale date label, `M/D/YYYY`.
    pub date: String,
    pub revenue: f64,
    pub invoices: i64,
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardStats {
    pub total_revenue: f64,
    pub total_invoices: i64,
    pub total_products: i64,
    pub low_stock_count: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
