//! # Activity Log
//!
//! Who changed what. Every product or invoice mutation produces one entry,
//! which the store writes in the same transaction as the change.
//!
//! ```text
//! products().insert(..)   ──► ADD_PRODUCT      "Added product Wireless Mouse (WM-001)"
//! invoices().create(..)   ──► ADD_INVOICE      "Created draft invoice INV-00001 ..."
//! invoices().update(..)   ──► UPDATE_INVOICE   "Invoice INV-00001: draft → paid"
//! invoices().delete(..)   ──► DELETE_INVOICE   "Deleted invoice INV-00001"
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::types::{Invoice, InvoiceStatus, Product};

/// Entries returned when the caller asks for no particular page size.
pub const DEFAULT_ACTIVITY_LIMIT: i64 = 50;

/// Largest page of entries returned at once.
pub const MAX_ACTIVITY_LIMIT: i64 = 500;

/// Kind of mutation an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
    AddProduct,
    UpdateProduct,
    DeleteProduct,
    AddInvoice,
    UpdateInvoice,
    DeleteInvoice,
}

impl ActivityAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::AddProduct => "ADD_PRODUCT",
            ActivityAction::UpdateProduct => "UPDATE_PRODUCT",
            ActivityAction::DeleteProduct => "DELETE_PRODUCT",
            ActivityAction::AddInvoice => "ADD_INVOICE",
            ActivityAction::UpdateInvoice => "UPDATE_INVOICE",
            ActivityAction::DeleteInvoice => "DELETE_INVOICE",
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored activity entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ActivityLog {
    pub id: String,
    pub user_id: String,
    pub action_type: ActivityAction,
    /// Id of the product or invoice. The entity may no longer exist.
    pub entity_id: String,
    pub description: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// An entry about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub action: ActivityAction,
    pub entity_id: String,
    pub description: String,
}

impl NewActivity {
    fn new(action: ActivityAction, entity_id: &str, description: String) -> Self {
        NewActivity {
            action,
            entity_id: entity_id.to_string(),
            description,
        }
    }

    pub fn product_added(product: &Product) -> Self {
        Self::new(
            ActivityAction::AddProduct,
            &product.id,
            format!(
                "Added product {} ({}) with {} in stock",
                product.name, product.sku, product.stock
            ),
        )
    }

    pub fn product_updated(product: &Product) -> Self {
        Self::new(
            ActivityAction::UpdateProduct,
            &product.id,
            format!("Updated product {} ({})", product.name, product.sku),
        )
    }

    pub fn product_deleted(product: &Product) -> Self {
        Self::new(
            ActivityAction::DeleteProduct,
            &product.id,
            format!("Deleted product {} ({})", product.name, product.sku),
        )
    }

    pub fn invoice_created(invoice: &Invoice) -> Self {
        Self::new(
            ActivityAction::AddInvoice,
            &invoice.id,
            format!(
                "Created {} invoice {} for {}: {} line(s), total {:.2}, {}",
                invoice.status,
                invoice.invoice_number,
                invoice.customer_name,
                invoice.items.len(),
                invoice.total,
                invoice.payment_method
            ),
        )
    }

    /// A status change is spelled out; other edits get a generic line.
    pub fn invoice_updated(
        invoice_id: &str,
        invoice_number: &str,
        previous: InvoiceStatus,
        current: InvoiceStatus,
    ) -> Self {
        let description = if previous == current {
            format!("Updated invoice {invoice_number}")
        } else {
            format!("Invoice {invoice_number}: {previous} → {current}")
        };
        Self::new(ActivityAction::UpdateInvoice, invoice_id, description)
    }

    pub fn invoice_deleted(invoice_id: &str, invoice_number: &str) -> Self {
        Self::new(
            ActivityAction::DeleteInvoice,
            invoice_id,
            format!("Deleted invoice {invoice_number}"),
        )
    }
}

/// Page size for an activity listing: default when absent, clamped to
/// `1..=MAX_ACTIVITY_LIMIT`.
pub fn activity_limit(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
        .clamp(1, MAX_ACTIVITY_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentMethod;

    fn mouse() -> Product {
        Product {
            id: "p-1".into(),
            user_id: "alice".into(),
            name: "Wireless Mouse".into(),
            sku: "WM-001".into(),
            category: "Electronics".into(),
            description: String::new(),
            price: 29.99,
            discount: 0.0,
            stock: 150,
            min_stock: 20,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn invoice(status: InvoiceStatus) -> Invoice {
        Invoice {
            id: "inv-1".into(),
            user_id: "alice".into(),
            invoice_number: "INV-00001".into(),
            customer_name: "Ada Lovelace".into(),
            customer_email: String::new(),
            customer_phone: String::new(),
            customer_address: None,
            notes: None,
            subtotal: 180.0,
            tax: 13.68,
            discount: 9.0,
            total: 184.68,
            status,
            payment_method: PaymentMethod::Card,
            items: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_product_entries() {
        let added = NewActivity::product_added(&mouse());
        assert_eq!(added.action, ActivityAction::AddProduct);
        assert_eq!(added.entity_id, "p-1");
        assert_eq!(added.description, "Added product Wireless Mouse (WM-001) with 150 in stock");

        let deleted = NewActivity::product_deleted(&mouse());
        assert_eq!(deleted.action, ActivityAction::DeleteProduct);
        assert_eq!(deleted.description, "Deleted product Wireless Mouse (WM-001)");
    }

    #[test]
    fn test_invoice_entries() {
        let created = NewActivity::invoice_created(&invoice(InvoiceStatus::Draft));
        assert_eq!(created.action, ActivityAction::AddInvoice);
        assert_eq!(
            created.description,
            "Created draft invoice INV-00001 for Ada Lovelace: 0 line(s), total 184.68, card"
        );

        let paid = NewActivity::invoice_updated("inv-1", "INV-00001", InvoiceStatus::Draft, InvoiceStatus::Paid);
        assert_eq!(paid.action, ActivityAction::UpdateInvoice);
        assert_eq!(paid.description, "Invoice INV-00001: draft → paid");

        let edited = NewActivity::invoice_updated("inv-1", "INV-00001", InvoiceStatus::Paid, InvoiceStatus::Paid);
        assert_eq!(edited.description, "Updated invoice INV-00001");

        let deleted = NewActivity::invoice_deleted("inv-1", "INV-00001");
        assert_eq!(deleted.action, ActivityAction::DeleteInvoice);
        assert_eq!(deleted.entity_id, "inv-1");
    }

    #[test]
    fn test_action_serde() {
        assert_eq!(
            serde_json::to_string(&ActivityAction::DeleteInvoice).unwrap(),
            "\"DELETE_INVOICE\""
        );
        assert_eq!(ActivityAction::AddProduct.to_string(), "ADD_PRODUCT");
    }

    #[test]
    fn test_activity_limit() {
        assert_eq!(activity_limit(None), DEFAULT_ACTIVITY_LIMIT);
        assert_eq!(activity_limit(Some(10)), 10);
        assert_eq!(activity_limit(Some(0)), 1);
        assert_eq!(activity_limit(Some(-4)), 1);
        assert_eq!(activity_limit(Some(10_000)), MAX_ACTIVITY_LIMIT);
    }
}
