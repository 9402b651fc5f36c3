//! # Invoice Repository
//!
//! Invoice creation (the stock-reserving commit), reads with line items,
//! status/customer updates and deletes.
//!
//! ## Commit Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create(session, input)                                                 │
//! │       │                                                                 │
//! │       ├── validate customer fields and starting status                  │
//! │       ├── line count ≤ MAX_INVOICE_LINES (before any lookup)            │
//! │       ├── load referenced products (owner only)                         │
//! │       ├── check_reservation(items, products) ──► ReservationPlan        │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │   ├── for each delta:                                                   │
//! │   │     UPDATE inventory_items SET stock = stock - q                    │
//! │   │      WHERE id = ? AND user_id = ? AND stock >= q                    │
//! │   │     0 rows? ──► ROLLBACK, InsufficientStock (nothing written)       │
//! │   ├── SELECT COUNT(*) FROM invoices ──► INV-{count+1:05}               │
//! │   ├── INSERT invoices                                                   │
//! │   ├── INSERT invoice_items (position = line order)                      │
//! │   └── INSERT activity_logs (ADD_INVOICE)                                │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The transaction opens with a write so SQLite takes the write lock up
//! front; two commits for the same stock are serialised and the second one
//! sees the decremented value.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::activity;
use crate::repository::product::ProductRepository;
use stockly_core::numbering::next_invoice_number;
use stockly_core::pricing::{quote, Quote};
use stockly_core::reservation::{check_line_limit, check_reservation, ReservationPlan};
use stockly_core::validation::{validate_invoice_update, validate_new_invoice};
use stockly_core::{
    CoreError, Invoice, InvoiceLineItem, InvoiceStatus, InvoiceUpdate, NewActivity, NewInvoice,
    PaymentMethod, Session,
};

const ITEM_COLUMNS: &str = "ii.id, ii.invoice_id, ii.inventory_item_id, ii.name, ii.sku, \
     ii.price, ii.discount, ii.quantity, ii.total";

const INVOICE_COLUMNS: &str = "id, user_id, invoice_number, customer_name, customer_email, \
     customer_phone, customer_address, notes, subtotal, tax, discount, total, status, \
     payment_method, created_at, updated_at";

// =============================================================================
// Row Type
// =============================================================================

/// An `invoices` row, before its line items are attached.
#[derive(Debug, Clone, sqlx::FromRow)]
struct InvoiceRow {
    id: String,
    user_id: String,
    invoice_number: String,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    customer_address: Option<String>,
    notes: Option<String>,
    subtotal: f64,
    tax: f64,
    discount: f64,
    total: f64,
    status: InvoiceStatus,
    payment_method: PaymentMethod,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InvoiceRow {
    fn with_items(self, items: Vec<InvoiceLineItem>) -> Invoice {
        Invoice {
            id: self.id,
            user_id: self.user_id,
            invoice_number: self.invoice_number,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            customer_address: self.customer_address,
            notes: self.notes,
            subtotal: self.subtotal,
            tax: self.tax,
            discount: self.discount,
            total: self.total,
            status: self.status,
            payment_method: self.payment_method,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn optional_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Lists the owner's invoices with their line items, newest first.
    pub async fn list(&self, session: &Session) -> DbResult<Vec<Invoice>> {
        debug!(user_id = %session.user_id, "Listing invoices");

        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices \
             WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC"
        );
        let rows = sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(&session.user_id)
            .fetch_all(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM invoice_items ii \
             INNER JOIN invoices i ON i.id = ii.invoice_id \
             WHERE i.user_id = ?1 ORDER BY ii.invoice_id, ii.position"
        );
        let items = sqlx::query_as::<_, InvoiceLineItem>(&sql)
            .bind(&session.user_id)
            .fetch_all(&self.pool)
            .await?;

        let mut by_invoice: HashMap<String, Vec<InvoiceLineItem>> = HashMap::new();
        for item in items {
            by_invoice.entry(item.invoice_id.clone()).or_default().push(item);
        }

        let invoices: Vec<Invoice> = rows
            .into_iter()
            .map(|row| {
                let items = by_invoice.remove(&row.id).unwrap_or_default();
                row.with_items(items)
            })
            .collect();

        debug!(count = invoices.len(), "Listed invoices");
        Ok(invoices)
    }

    /// Gets an invoice with its line items.
    ///
    /// ## Returns
    /// * `Ok(None)` - No such invoice for this owner
    pub async fn get(&self, session: &Session, id: &str) -> DbResult<Option<Invoice>> {
        let Some(row) = self.get_row(session, id).await? else {
            return Ok(None);
        };

        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM invoice_items ii \
             WHERE ii.invoice_id = ?1 ORDER BY ii.position"
        );
        let items = sqlx::query_as::<_, InvoiceLineItem>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(Some(row.with_items(items)))
    }

    async fn get_row(&self, session: &Session, id: &str) -> DbResult<Option<InvoiceRow>> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1 AND user_id = ?2");
        let row = sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(id)
            .bind(&session.user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Counts the owner's invoices.
    pub async fn count(&self, session: &Session) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE user_id = ?1")
            .bind(&session.user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Prices a draft invoice against current products. Writes nothing.
    pub async fn quote(&self, session: &Session, input: &NewInvoice) -> DbResult<Quote> {
        check_line_limit(&input.items)?;
        let ids: Vec<&str> = input.items.iter().filter_map(|l| l.product_id()).collect();
        let products = self.products().get_many(session, &ids).await?;
        Ok(quote(
            &input.items,
            &products,
            input.discount_percent,
            input.tax_percent,
        )?)
    }

    // -------------------------------------------------------------------------
    // Create
    // -------------------------------------------------------------------------

    /// Creates an invoice, reserving stock for every line.
    ///
    /// ## Returns
    /// * `Ok(Invoice)` - Committed invoice with a fresh number
    /// * `Err(DbError::Rejected)` - Validation or stock check failed;
    ///   nothing was written
    pub async fn create(&self, session: &Session, input: &NewInvoice) -> DbResult<Invoice> {
        validate_new_invoice(input)?;
        check_line_limit(&input.items)?;

        let ids: Vec<&str> = input.items.iter().filter_map(|l| l.product_id()).collect();
        let products = self.products().get_many(session, &ids).await?;
        let plan = check_reservation(&input.items, &products)?;

        self.commit(session, input, &plan).await
    }

    /// Applies an accepted reservation plan in one transaction.
    ///
    /// The plan may be stale: each decrement only applies while enough stock
    /// remains, and the whole invoice is rolled back otherwise.
    pub async fn commit(
        &self,
        session: &Session,
        input: &NewInvoice,
        plan: &ReservationPlan,
    ) -> DbResult<Invoice> {
        let now = Utc::now();
        let invoice_id = Uuid::new_v4().to_string();

        let mut tx = self.pool.begin().await?;

        for delta in &plan.deltas {
            let result = sqlx::query(
                r#"
                UPDATE inventory_items
                SET stock = stock - ?1, updated_at = ?2
                WHERE id = ?3 AND user_id = ?4 AND stock >= ?1
                "#,
            )
            .bind(delta.quantity)
            .bind(now)
            .bind(&delta.product_id)
            .bind(&session.user_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                tx.rollback().await?;
                warn!(
                    user_id = %session.user_id,
                    product_id = %delta.product_id,
                    requested = delta.quantity,
                    "Stock changed since check, invoice rejected"
                );
                return Err(self.shortage(session, &delta.product_id, &delta.name, delta.quantity).await);
            }
        }

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE user_id = ?1")
            .bind(&session.user_id)
            .fetch_one(&mut *tx)
            .await?;
        let invoice_number = next_invoice_number(existing);

        let items = plan.line_items(&invoice_id);
        let totals = plan.totals(input.discount_percent, input.tax_percent);

        let invoice = Invoice {
            id: invoice_id,
            user_id: session.user_id.clone(),
            invoice_number,
            customer_name: input.customer_name.trim().to_string(),
            customer_email: input.customer_email.trim().to_string(),
            customer_phone: input.customer_phone.trim().to_string(),
            customer_address: optional_text(&input.customer_address),
            notes: optional_text(&input.notes),
            subtotal: totals.subtotal.amount(),
            tax: totals.tax_amount.amount(),
            discount: totals.discount_amount.amount(),
            total: totals.total.amount(),
            status: input.status,
            payment_method: input.payment_method,
            items,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, user_id, invoice_number,
                customer_name, customer_email, customer_phone, customer_address, notes,
                subtotal, tax, discount, total, status, payment_method,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.user_id)
        .bind(&invoice.invoice_number)
        .bind(&invoice.customer_name)
        .bind(&invoice.customer_email)
        .bind(&invoice.customer_phone)
        .bind(&invoice.customer_address)
        .bind(&invoice.notes)
        .bind(invoice.subtotal)
        .bind(invoice.tax)
        .bind(invoice.discount)
        .bind(invoice.total)
        .bind(invoice.status)
        .bind(invoice.payment_method)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&mut *tx)
        .await?;

        for (position, item) in invoice.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO invoice_items (
                    id, invoice_id, position, inventory_item_id,
                    name, sku, price, discount, quantity, total
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(&item.id)
            .bind(&item.invoice_id)
            .bind(position as i64)
            .bind(&item.inventory_item_id)
            .bind(&item.name)
            .bind(&item.sku)
            .bind(item.price)
            .bind(item.discount)
            .bind(item.quantity)
            .bind(item.total)
            .execute(&mut *tx)
            .await?;
        }

        activity::record(&mut *tx, session, NewActivity::invoice_created(&invoice)).await?;
        tx.commit().await?;

        info!(
            user_id = %session.user_id,
            invoice_id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            lines = invoice.items.len(),
            total = invoice.total,
            "Invoice committed"
        );
        Ok(invoice)
    }

    /// Builds the rejection for a failed conditional decrement from the
    /// stock as it is now.
    async fn shortage(&self, session: &Session, product_id: &str, name: &str, requested: i64) -> DbError {
        let current: Result<Option<i64>, sqlx::Error> =
            sqlx::query_scalar("SELECT stock FROM inventory_items WHERE id = ?1 AND user_id = ?2")
                .bind(product_id)
                .bind(&session.user_id)
                .fetch_optional(&self.pool)
                .await;

        match current {
            Ok(Some(available)) => CoreError::InsufficientStock {
                product_id: product_id.to_string(),
                name: name.to_string(),
                available,
                requested,
            }
            .into(),
            Ok(None) => CoreError::ProductNotFound(product_id.to_string()).into(),
            Err(e) => e.into(),
        }
    }

    // -------------------------------------------------------------------------
    // Update / Delete
    // -------------------------------------------------------------------------

    /// Updates status, payment method and customer fields. Line items and
    /// stock are untouched.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No such invoice for this owner
    /// * `Err(DbError::Rejected(InvalidStatusTransition))` - e.g. cancelled → paid
    pub async fn update(&self, session: &Session, id: &str, update: &InvoiceUpdate) -> DbResult<Invoice> {
        validate_invoice_update(update)?;
        debug!(user_id = %session.user_id, id = %id, status = ?update.status, "Updating invoice");

        let mut row = self
            .get_row(session, id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", id))?;
        let previous = row.status;

        if let Some(next) = update.status {
            if !row.status.can_transition_to(next) {
                return Err(CoreError::InvalidStatusTransition {
                    from: row.status,
                    to: next,
                }
                .into());
            }
            row.status = next;
        }
        if let Some(method) = update.payment_method {
            row.payment_method = method;
        }
        if let Some(name) = &update.customer_name {
            row.customer_name = name.trim().to_string();
        }
        if let Some(email) = &update.customer_email {
            row.customer_email = email.trim().to_string();
        }
        if let Some(phone) = &update.customer_phone {
            row.customer_phone = phone.trim().to_string();
        }
        if update.customer_address.is_some() {
            row.customer_address = optional_text(&update.customer_address);
        }
        if update.notes.is_some() {
            row.notes = optional_text(&update.notes);
        }

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE invoices SET
                status = ?3,
                payment_method = ?4,
                customer_name = ?5,
                customer_email = ?6,
                customer_phone = ?7,
                customer_address = ?8,
                notes = ?9,
                updated_at = ?10
            WHERE id = ?1 AND user_id = ?2
            "#,
        )
        .bind(id)
        .bind(&session.user_id)
        .bind(row.status)
        .bind(row.payment_method)
        .bind(&row.customer_name)
        .bind(&row.customer_email)
        .bind(&row.customer_phone)
        .bind(&row.customer_address)
        .bind(&row.notes)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        let entry = NewActivity::invoice_updated(&row.id, &row.invoice_number, previous, row.status);
        activity::record(&mut *tx, session, entry).await?;
        tx.commit().await?;

        self.get(session, id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", id))
    }

    /// Deletes an invoice and its line items. Stock is not restored.
    pub async fn delete(&self, session: &Session, id: &str) -> DbResult<()> {
        debug!(user_id = %session.user_id, id = %id, "Deleting invoice");

        let mut tx = self.pool.begin().await?;

        let number: String = sqlx::query_scalar(
            "DELETE FROM invoices WHERE id = ?1 AND user_id = ?2 RETURNING invoice_number",
        )
        .bind(id)
        .bind(&session.user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Invoice", id))?;

        activity::record(&mut *tx, session, NewActivity::invoice_deleted(id, &number)).await?;
        tx.commit().await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
