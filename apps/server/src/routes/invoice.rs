//! # Invoice Routes
//!
//! ## Create Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Invoice form                                                           │
//! │       │  (every edit)                                                   │
//! │       ▼                                                                 │
//! │  POST /api/invoices/quote ──► priced lines + totals   (writes nothing) │
//! │       │                                                                 │
//! │       │  (submit)                                                       │
//! │       ▼                                                                 │
//! │  POST /api/invoices                                                     │
//! │       │                                                                 │
//! │       ├── empty / unselected line / bad quantity ──► 400               │
//! │       ├── not enough stock (now or at commit)    ──► 409               │
//! │       └── invoice + items + stock decrements     ──► 201               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `discountPercent` and `taxPercent` accept numbers or numeric strings;
//! anything else counts as 0, including a missing or null field. The
//! configured default tax is only offered to the form as
//! `defaultTaxPercent` in the quote response.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::session::CurrentUser;
use crate::state::AppState;
use stockly_core::money::Percentage;
use stockly_core::pricing::{lenient_percentage, Quote};
use stockly_core::{
    Invoice, InvoiceLineItem, InvoiceStatus, InvoiceUpdate, LineItemInput, NewInvoice,
    PaymentMethod,
};

// =============================================================================
// DTOs
// =============================================================================

/// Line item as sent to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItemDto {
    pub id: String,
    pub inventory_item_id: String,
    pub name: String,
    pub sku: String,
    pub price: f64,
    pub discount: f64,
    pub quantity: i64,
    pub total: f64,
}

impl From<InvoiceLineItem> for InvoiceItemDto {
    fn from(item: InvoiceLineItem) -> Self {
        InvoiceItemDto {
            id: item.id,
            inventory_item_id: item.inventory_item_id,
            name: item.name,
            sku: item.sku,
            price: item.price,
            discount: item.discount,
            quantity: item.quantity,
            total: item.total,
        }
    }
}

/// Invoice with its items as sent to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDto {
    pub id: String,
    pub invoice_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: Option<String>,
    pub notes: Option<String>,
    pub subtotal: f64,
    /// Invoice-level discount amount.
    pub discount: f64,
    /// Tax amount.
    pub tax: f64,
    pub total: f64,
    pub status: InvoiceStatus,
    pub payment_method: PaymentMethod,
    pub items: Vec<InvoiceItemDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Invoice> for InvoiceDto {
    fn from(inv: Invoice) -> Self {
        InvoiceDto {
            id: inv.id,
            invoice_number: inv.invoice_number,
            customer_name: inv.customer_name,
            customer_email: inv.customer_email,
            customer_phone: inv.customer_phone,
            customer_address: inv.customer_address,
            notes: inv.notes,
            subtotal: inv.subtotal,
            discount: inv.discount,
            tax: inv.tax,
            total: inv.total,
            status: inv.status,
            payment_method: inv.payment_method,
            items: inv.items.into_iter().map(InvoiceItemDto::from).collect(),
            created_at: inv.created_at,
            updated_at: inv.updated_at,
        }
    }
}

/// One line of the invoice form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRequest {
    /// Missing or blank while no product is chosen.
    #[serde(default)]
    pub inventory_item_id: Option<String>,
    pub quantity: i64,
}

/// Body of `POST /api/invoices` and `POST /api/invoices/quote`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    #[serde(default)]
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
    pub items: Vec<LineItemRequest>,
    #[serde(default)]
    pub discount_percent: Option<Value>,
    #[serde(default)]
    pub tax_percent: Option<Value>,
    /// `draft` or `paid`.
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl CreateInvoiceRequest {
    /// Converts to the core input.
    pub fn into_new_invoice(self) -> NewInvoice {
        NewInvoice {
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            customer_address: self.customer_address,
            notes: self.notes,
            items: self
                .items
                .into_iter()
                .map(|l| LineItemInput {
                    inventory_item_id: l.inventory_item_id,
                    quantity: l.quantity,
                })
                .collect(),
            discount_percent: percent(self.discount_percent),
            tax_percent: percent(self.tax_percent),
            status: self.status,
            payment_method: self.payment_method,
        }
    }
}

/// Reads a free-text percentage field. Missing, null and non-numeric all read as 0.
fn percent(raw: Option<Value>) -> Percentage {
    match raw {
        None | Some(Value::Null) => Percentage::zero(),
        Some(value) => lenient_percentage(value).unwrap_or_else(|_| Percentage::zero()),
    }
}

/// Body of `PATCH /api/invoices/{id}`. Line items cannot be changed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceRequest {
    pub status: Option<InvoiceStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    /// `""` clears the address.
    pub customer_address: Option<String>,
    /// `""` clears the notes.
    pub notes: Option<String>,
}

impl From<UpdateInvoiceRequest> for InvoiceUpdate {
    fn from(r: UpdateInvoiceRequest) -> Self {
        InvoiceUpdate {
            status: r.status,
            payment_method: r.payment_method,
            customer_name: r.customer_name,
            customer_email: r.customer_email,
            customer_phone: r.customer_phone,
            customer_address: r.customer_address,
            notes: r.notes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLineDto {
    pub inventory_item_id: String,
    pub name: String,
    pub sku: String,
    pub price: f64,
    pub discount: f64,
    pub unit_price: f64,
    pub quantity: i64,
    pub total: f64,
    pub available: i64,
}

/// Priced draft invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDto {
    pub lines: Vec<QuoteLineDto>,
    pub subtotal: f64,
    pub discount_amount: f64,
    pub taxable_amount: f64,
    pub tax_amount: f64,
    pub total: f64,
    /// Total rounded and formatted for display, e.g. `$184.68`.
    pub formatted_total: String,
    /// Tax percentage a new form should start with. Never applied by the server.
    pub default_tax_percent: f64,
}

impl QuoteDto {
    fn new(quote: Quote, formatted_total: String, default_tax: Percentage) -> Self {
        let totals = quote.totals;
        QuoteDto {
            lines: quote
                .lines
                .into_iter()
                .map(|l| QuoteLineDto {
                    inventory_item_id: l.inventory_item_id,
                    name: l.name,
                    sku: l.sku,
                    price: l.price.amount(),
                    discount: l.discount.value(),
                    unit_price: l.unit_price.amount(),
                    quantity: l.quantity,
                    total: l.total.amount(),
                    available: l.available,
                })
                .collect(),
            subtotal: totals.subtotal.amount(),
            discount_amount: totals.discount_amount.amount(),
            taxable_amount: totals.taxable_amount.amount(),
            tax_amount: totals.tax_amount.amount(),
            total: totals.total.amount(),
            formatted_total,
            default_tax_percent: default_tax.value(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /api/invoices`
pub async fn list_invoices(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> ApiResult<Json<Vec<InvoiceDto>>> {
    let invoices = state.db.invoices().list(&session).await?;
    Ok(Json(invoices.into_iter().map(InvoiceDto::from).collect()))
}

/// `GET /api/invoices/{id}`
pub async fn get_invoice(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<InvoiceDto>> {
    let invoice = state
        .db
        .invoices()
        .get(&session, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Invoice", &id))?;

    Ok(Json(invoice.into()))
}

/// `POST /api/invoices/quote`
pub async fn quote_invoice(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    payload: Result<Json<CreateInvoiceRequest>, JsonRejection>,
) -> ApiResult<Json<QuoteDto>> {
    let Json(request) = payload?;
    let input = request.into_new_invoice();

    let quote = state.db.invoices().quote(&session, &input).await?;
    let formatted = state.config.format_currency(quote.totals.total);
    Ok(Json(QuoteDto::new(quote, formatted, state.config.default_tax())))
}

/// `POST /api/invoices`
pub async fn create_invoice(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    payload: Result<Json<CreateInvoiceRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<InvoiceDto>)> {
    let Json(request) = payload?;
    let input = request.into_new_invoice();

    let invoice = state.db.invoices().create(&session, &input).await?;
    info!(
        user_id = %session.user_id,
        number = %invoice.invoice_number,
        total = %state.config.format_currency(invoice.total_amount()),
        "Invoice created"
    );

    Ok((StatusCode::CREATED, Json(invoice.into())))
}

/// `PATCH /api/invoices/{id}`
pub async fn update_invoice(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateInvoiceRequest>, JsonRejection>,
) -> ApiResult<Json<InvoiceDto>> {
    let Json(request) = payload?;
    let invoice = state
        .db
        .invoices()
        .update(&session, &id, &request.into())
        .await?;

    Ok(Json(invoice.into()))
}

/// `DELETE /api/invoices/{id}`. Stock sold on the invoice is not restored.
pub async fn delete_invoice(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.invoices().delete(&session, &id).await?;
    info!(user_id = %session.user_id, id = %id, "Invoice deleted");
    Ok(StatusCode::NO_CONTENT)
}
