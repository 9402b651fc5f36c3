//! # stockly-core: Pure Business Logic for Stockly
//!
//! Everything that decides a number or a yes/no lives here, as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockly Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Dashboard Frontend (web)                       │   │
//! │  │    Inventory ──► Invoice Form ──► Invoice List ──► Dashboard    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    stockly-server (axum)                        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stockly-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────────┐ ┌───────────┐        │   │
//! │  │   │  types  │ │ pricing │ │ reservation │ │ analytics │        │   │
//! │  │   │ Product │ │  Money  │ │ stock check │ │ low stock │        │   │
//! │  │   │ Invoice │ │ totals  │ │   deltas    │ │ revenue   │        │   │
//! │  │   └─────────┘ └─────────┘ └─────────────┘ └───────────┘        │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  stockly-db (Persistence Layer)                 │   │
//! │  │          SQLite rows, migrations, repositories, blobs           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Invoice, InvoiceLineItem, Session, ...)
//! - [`money`] - Money and Percentage value types
//! - [`pricing`] - Line totals, invoice totals, quotes
//! - [`reservation`] - Stock reservation check and stock deltas
//! - [`analytics`] - Low stock, sales by product, revenue by date
//! - [`numbering`] - Human-readable invoice numbers
//! - [`activity`] - Activity log entries for product and invoice changes
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use stockly_core::money::{Money, Percentage};
//! use stockly_core::pricing::{compute_totals, line_total};
//!
//! // 2 units at 100.00 with a 10% product discount
//! let line = line_total(Money::new(100.0), Percentage::sanitize(10.0), 2);
//! assert!((line.amount() - 180.0).abs() < 1e-9);
//!
//! // 5% invoice discount, 8% tax
//! let totals = compute_totals([line], 5.0, 8.0);
//! assert!((totals.total.amount() - 184.68).abs() < 1e-9);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod activity;
pub mod analytics;
pub mod error;
pub mod money;
pub mod numbering;
pub mod pricing;
pub mod reservation;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use activity::{ActivityAction, ActivityLog, NewActivity};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Percentage};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed on a single invoice.
pub const MAX_INVOICE_LINES: usize = 100;

/// Maximum quantity of a single line item.
///
/// Catches typing 10000 instead of 100 before it drains the shelf.
pub const MAX_LINE_QUANTITY: i64 = 9_999;

/// Tax percentage the invoice form starts with when nothing is configured.
///
/// Handed to clients as a hint; a request without a tax percentage is taxed at 0.
pub const DEFAULT_TAX_PERCENT: f64 = 10.0;
