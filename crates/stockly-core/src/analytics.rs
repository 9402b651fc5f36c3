//! # Analytics Aggregation
//!
//! Derives the dashboard views from products and invoices. Only **paid**
//! invoices count towards sales and revenue; drafts and cancelled invoices
//! are ignored.
//!
//! ```text
//! products ──► low_stock ─────────────┐
//!                                     ├──► Dashboard
//! invoices ──► sales_by_product ──────┤
//!          ──► revenue_by_date ───────┤
//!          ──► dashboard_stats ───────┘
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{DashboardStats, Invoice, Product, RevenuePoint, SalesData};

/// Label format for revenue-by-date buckets (`3/7/2025`).
pub const DATE_LABEL_FORMAT: &str = "%-m/%-d/%Y";

// =============================================================================
// Low Stock
// =============================================================================

/// Products at or below their threshold, lowest stock first.
pub fn low_stock(products: &[Product]) -> Vec<Product> {
    let mut low: Vec<Product> = products.iter().filter(|p| p.is_low_stock()).cloned().collect();
    low.sort_by_key(|p| p.stock);
    low
}

// =============================================================================
// Sales by Product
// =============================================================================

/// Rolls up paid line items per product, highest revenue first.
///
/// The name is taken from the first line seen for a product.
/// `invoice_count` counts distinct invoices, so a product listed on two
/// lines of one invoice counts once.
pub fn sales_by_product(invoices: &[Invoice]) -> Vec<SalesData> {
    let mut order: Vec<String> = Vec::new();
    let mut rollup: HashMap<String, (SalesData, HashSet<&str>)> = HashMap::new();

    for invoice in invoices.iter().filter(|i| i.is_paid()) {
        for item in &invoice.items {
            let (entry, seen) = rollup
                .entry(item.inventory_item_id.clone())
                .or_insert_with(|| {
                    order.push(item.inventory_item_id.clone());
                    (
                        SalesData {
                            item_id: item.inventory_item_id.clone(),
                            item_name: item.name.clone(),
                            total_quantity: 0,
                            total_revenue: 0.0,
                            invoice_count: 0,
                        },
                        HashSet::new(),
                    )
                });
            entry.total_quantity += item.quantity;
            entry.total_revenue += item.total;
            if seen.insert(invoice.id.as_str()) {
                entry.invoice_count += 1;
            }
        }
    }

    let mut sales: Vec<SalesData> = order
        .iter()
        .filter_map(|id| rollup.remove(id).map(|(data, _)| data))
        .collect();
    sales.sort_by(|a, b| b.total_revenue.total_cmp(&a.total_revenue));
    sales
}

// =============================================================================
// Revenue by Date
// =============================================================================

/// Paid revenue per calendar day in `offset`, oldest day first.
///
/// ## Example
/// ```text
/// created_at 2025-03-07T23:30:00Z, offset -05:00  → "3/7/2025"
/// created_at 2025-03-08T02:00:00Z, offset -05:00  → "3/7/2025"
/// created_at 2025-03-08T02:00:00Z, offset +00:00  → "3/8/2025"
/// ```
pub fn revenue_by_date(invoices: &[Invoice], offset: FixedOffset) -> Vec<RevenuePoint> {
    let mut days: BTreeMap<NaiveDate, (f64, i64)> = BTreeMap::new();
    for invoice in invoices.iter().filter(|i| i.is_paid()) {
        let day = invoice.created_at.with_timezone(&offset).date_naive();
        let bucket = days.entry(day).or_insert((0.0, 0));
        bucket.0 += invoice.total;
        bucket.1 += 1;
    }

    days.into_iter()
        .map(|(day, (revenue, count))| RevenuePoint {
            date: day.format(DATE_LABEL_FORMAT).to_string(),
            revenue,
            invoices: count,
        })
        .collect()
}

// =============================================================================
// Stats
// =============================================================================

/// Headline numbers: paid revenue and count, product count, low-stock count.
pub fn dashboard_stats(products: &[Product], invoices: &[Invoice]) -> DashboardStats {
    let paid = invoices.iter().filter(|i| i.is_paid());
    let (total_revenue, total_invoices) =
        paid.fold((0.0, 0i64), |(sum, n), inv| (sum + inv.total, n + 1));

    DashboardStats {
        total_revenue,
        total_invoices,
        total_products: products.len() as i64,
        low_stock_count: products.iter().filter(|p| p.is_low_stock()).count() as i64,
    }
}

/// Everything the dashboard page shows, in one value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub sales_by_product: Vec<SalesData>,
    pub low_stock: Vec<Product>,
    pub revenue_by_date: Vec<RevenuePoint>,
}

/// Computes all dashboard views from one snapshot of products and invoices.
pub fn dashboard(products: &[Product], invoices: &[Invoice], offset: FixedOffset) -> Dashboard {
    Dashboard {
        stats: dashboard_stats(products, invoices),
        sales_by_product: sales_by_product(invoices),
        low_stock: low_stock(products),
        revenue_by_date: revenue_by_date(invoices, offset),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InvoiceLineItem, InvoiceStatus, PaymentMethod};
    use chrono::{DateTime, TimeZone, Utc};

    fn product(id: &str, stock: i64, min_stock: i64) -> Product {
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
            min_stock,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(invoice_id: &str, item_id: &str, quantity: i64, total: f64) -> InvoiceLineItem {
        InvoiceLineItem {
            id: format!("{invoice_id}-{item_id}"),
            invoice_id: invoice_id.into(),
            inventory_item_id: item_id.into(),
            name: format!("Product {item_id}"),
            sku: format!("SKU-{item_id}"),
            price: 30.0,
            discount: 0.0,
            quantity,
            total,
        }
    }

    fn invoice(
        id: &str,
        status: InvoiceStatus,
        created_at: DateTime<Utc>,
        items: Vec<InvoiceLineItem>,
    ) -> Invoice {
        let total = items.iter().map(|i| i.total).sum();
        Invoice {
            id: id.into(),
            user_id: "u-1".into(),
            invoice_number: "INV-00001".into(),
            customer_name: "Ada".into(),
            customer_email: String::new(),
            customer_phone: String::new(),
            customer_address: None,
            notes: None,
            subtotal: total,
            tax: 0.0,
            discount: 0.0,
            total,
            status,
            payment_method: PaymentMethod::Cash,
            items,
            created_at,
            updated_at: created_at,
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_low_stock_inclusive_and_sorted() {
        let products = [product("a", 10, 10), product("b", 11, 10), product("c", 2, 5)];
        let low = low_stock(&products);
        let ids: Vec<&str> = low.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[test]
    fn test_sales_two_paid_invoices() {
        let now = Utc::now();
        let invoices = [
            invoice("i1", InvoiceStatus::Paid, now, vec![line("i1", "x", 3, 90.0)]),
            invoice("i2", InvoiceStatus::Paid, now, vec![line("i2", "x", 3, 90.0)]),
            invoice("i3", InvoiceStatus::Draft, now, vec![line("i3", "x", 10, 300.0)]),
        ];
        let sales = sales_by_product(&invoices);
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].total_quantity, 6);
        assert_eq!(sales[0].total_revenue, 180.0);
        assert_eq!(sales[0].invoice_count, 2);
    }

    #[test]
    fn test_sales_quantity_revenue_count() {
        let now = Utc::now();
        let invoices = [
            invoice("i1", InvoiceStatus::Paid, now, vec![line("i1", "x", 3, 30.0)]),
            invoice("i2", InvoiceStatus::Paid, now, vec![line("i2", "x", 3, 30.0)]),
        ];
        let sales = sales_by_product(&invoices);
        assert_eq!(
            (sales[0].total_quantity, sales[0].total_revenue, sales[0].invoice_count),
            (6, 60.0, 2)
        );
    }

    #[test]
    fn test_sales_sorted_by_revenue_and_distinct_invoices() {
        let now = Utc::now();
        let invoices = [
            invoice(
                "i1",
                InvoiceStatus::Paid,
                now,
                vec![line("i1", "x", 1, 10.0), line("i1", "y", 1, 50.0), line("i1", "x", 2, 20.0)],
            ),
            invoice("i2", InvoiceStatus::Cancelled, now, vec![line("i2", "y", 9, 900.0)]),
        ];
        let sales = sales_by_product(&invoices);
        assert_eq!(sales[0].item_id, "y");
        assert_eq!(sales[1].item_id, "x");
        assert_eq!(sales[1].total_quantity, 3);
        assert_eq!(sales[1].invoice_count, 1);
    }

    #[test]
    fn test_revenue_by_date_buckets_in_offset() {
        let invoices = [
            invoice("i1", InvoiceStatus::Paid, at(2025, 3, 8, 2), vec![line("i1", "x", 1, 10.0)]),
            invoice("i2", InvoiceStatus::Paid, at(2025, 3, 7, 20), vec![line("i2", "x", 1, 5.0)]),
            invoice("i3", InvoiceStatus::Paid, at(2025, 3, 10, 12), vec![line("i3", "x", 1, 1.0)]),
            invoice("i4", InvoiceStatus::Draft, at(2025, 3, 7, 12), vec![line("i4", "x", 1, 99.0)]),
        ];

        let east_coast = FixedOffset::west_opt(5 * 3600).unwrap();
        let points = revenue_by_date(&invoices, east_coast);
        assert_eq!(
            points,
            vec![
                RevenuePoint { date: "3/7/2025".into(), revenue: 15.0, invoices: 2 },
                RevenuePoint { date: "3/10/2025".into(), revenue: 1.0, invoices: 1 },
            ]
        );

        let utc = FixedOffset::east_opt(0).unwrap();
        let points = revenue_by_date(&invoices, utc);
        let labels: Vec<&str> = points.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(labels, vec!["3/7/2025", "3/8/2025", "3/10/2025"]);
    }

    #[test]
    fn test_dashboard_stats() {
        let now = Utc::now();
        let products = [product("a", 10, 10), product("b", 11, 10)];
        let invoices = [
            invoice("i1", InvoiceStatus::Paid, now, vec![line("i1", "a", 1, 40.0)]),
            invoice("i2", InvoiceStatus::Draft, now, vec![line("i2", "a", 1, 60.0)]),
        ];
        let stats = dashboard_stats(&products, &invoices);
        assert_eq!(
            stats,
            DashboardStats {
                total_revenue: 40.0,
                total_invoices: 1,
                total_products: 2,
                low_stock_count: 1,
            }
        );

        let all = dashboard(&products, &invoices, FixedOffset::east_opt(0).unwrap());
        assert_eq!(all.stats, stats);
        assert_eq!(all.low_stock.len(), 1);
        assert_eq!(all.sales_by_product.len(), 1);
        assert_eq!(all.revenue_by_date.len(), 1);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(low_stock(&[]).is_empty());
        assert!(sales_by_product(&[]).is_empty());
        assert!(revenue_by_date(&[], FixedOffset::east_opt(0).unwrap()).is_empty());
        assert_eq!(dashboard_stats(&[], &[]), DashboardStats::default());
    }
}
