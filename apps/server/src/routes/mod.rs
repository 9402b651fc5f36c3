//! # HTTP Routes
//!
//! ```text
//! GET    /health
//!
//! GET    /api/products                 list (newest first)
//! POST   /api/products                 create
//! GET    /api/products/{id}            get
//! PATCH  /api/products/{id}            partial update
//! DELETE /api/products/{id}            delete (and its image)
//! POST   /api/products/images?ext=png  upload raw image bytes
//! DELETE /api/products/images?url=...  delete an uploaded image
//!
//! GET    /api/invoices                 list with items (newest first)
//! POST   /api/invoices                 create (reserves stock)
//! POST   /api/invoices/quote           price a draft, nothing committed
//! GET    /api/invoices/{id}            get with items
//! PATCH  /api/invoices/{id}            status, payment method, customer fields
//! DELETE /api/invoices/{id}            delete
//!
//! GET    /api/dashboard                stats, sales, low stock, revenue
//! GET    /api/activity?limit=&entityId=  product and invoice changes
//! ```
//!
//! Every `/api` handler takes a [`crate::session::CurrentUser`].

pub mod activity;
pub mod dashboard;
pub mod health;
pub mod image;
pub mod invoice;
pub mod product;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Routes mounted under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            get(product::list_products).post(product::create_product),
        )
        .route(
            "/products/images",
            post(image::upload_image).delete(image::delete_image),
        )
        .route(
            "/products/{id}",
            get(product::get_product)
                .patch(product::update_product)
                .delete(product::delete_product),
        )
        .route(
            "/invoices",
            get(invoice::list_invoices).post(invoice::create_invoice),
        )
        .route("/invoices/quote", post(invoice::quote_invoice))
        .route(
            "/invoices/{id}",
            get(invoice::get_invoice)
                .patch(invoice::update_invoice)
                .delete(invoice::delete_invoice),
        )
        .route("/dashboard", get(dashboard::get_dashboard))
        .route("/activity", get(activity::list_activity))
}
