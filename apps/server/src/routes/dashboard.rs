//! Dashboard endpoint: one read of products and invoices, all derived views.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::routes::product::ProductDto;
use crate::session::CurrentUser;
use crate::state::AppState;
use stockly_core::analytics::{self, Dashboard};
use stockly_core::money::Money;
use stockly_core::{RevenuePoint, SalesData};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsDto {
    pub total_revenue: f64,
    pub formatted_revenue: String,
    pub total_invoices: i64,
    pub total_products: i64,
    pub low_stock_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesDto {
    pub item_id: String,
    pub item_name: String,
    pub total_quantity: i64,
    pub total_revenue: f64,
    pub invoice_count: i64,
}

impl From<SalesData> for SalesDto {
    fn from(s: SalesData) -> Self {
        SalesDto {
            item_id: s.item_id,
            item_name: s.item_name,
            total_quantity: s.total_quantity,
            total_revenue: s.total_revenue,
            invoice_count: s.invoice_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueDto {
    /// `M/D/YYYY` in the configured UTC offset.
    pub date: String,
    pub revenue: f64,
    pub invoices: i64,
}

impl From<RevenuePoint> for RevenueDto {
    fn from(p: RevenuePoint) -> Self {
        RevenueDto {
            date: p.date,
            revenue: p.revenue,
            invoices: p.invoices,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDto {
    pub stats: StatsDto,
    pub sales_by_product: Vec<SalesDto>,
    pub low_stock: Vec<ProductDto>,
    pub revenue_by_date: Vec<RevenueDto>,
}

/// `GET /api/dashboard`
pub async fn get_dashboard(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> ApiResult<Json<DashboardDto>> {
    let products = state.db.products().list(&session).await?;
    let invoices = state.db.invoices().list(&session).await?;

    let Dashboard {
        stats,
        sales_by_product,
        low_stock,
        revenue_by_date,
    } = analytics::dashboard(&products, &invoices, state.offset);

    Ok(Json(DashboardDto {
        stats: StatsDto {
            total_revenue: stats.total_revenue,
            formatted_revenue: state.config.format_currency(Money::new(stats.total_revenue)),
            total_invoices: stats.total_invoices,
            total_products: stats.total_products,
            low_stock_count: stats.low_stock_count,
        },
        sales_by_product: sales_by_product.into_iter().map(SalesDto::from).collect(),
        low_stock: low_stock.into_iter().map(ProductDto::from).collect(),
        revenue_by_date: revenue_by_date.into_iter().map(RevenueDto::from).collect(),
    }))
}
