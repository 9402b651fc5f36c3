//! # Product Routes
//!
//! CRUD for the inventory table.
//!
//! ## Image Lifecycle
//! ```text
//! POST /api/products/images ──► url
//!        │
//!        ▼
//! POST /api/products { imageUrl: url }      product keeps the URL only
//!        │
//!        ├── PATCH { imageUrl: other }  ──► old image removed (best effort)
//!        ├── PATCH { imageUrl: "" }     ──► image cleared, old one removed
//!        └── DELETE /api/products/{id}  ──► row removed, then its image
//! ```

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::routes::image::discard_image;
use crate::session::CurrentUser;
use crate::state::AppState;
use stockly_core::pricing::final_unit_price;
use stockly_core::{NewProduct, Product, ProductUpdate};

/// Product as sent to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub category: String,
    pub description: String,
    pub price: f64,
    pub discount: f64,
    /// Unit price after the product discount.
    pub final_price: f64,
    pub stock: i64,
    pub min_stock: i64,
    pub image_url: Option<String>,
    /// Whether the product shows up in the low-stock list.
    pub low_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        ProductDto {
            final_price: final_unit_price(p.unit_price(), p.discount_rate()).amount(),
            low_stock: p.is_low_stock(),
            id: p.id,
            name: p.name,
            sku: p.sku,
            category: p.category,
            description: p.description,
            price: p.price,
            discount: p.discount,
            stock: p.stock,
            min_stock: p.min_stock,
            image_url: p.image_url,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Body of `POST /api/products`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
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

impl From<CreateProductRequest> for NewProduct {
    fn from(r: CreateProductRequest) -> Self {
        NewProduct {
            name: r.name,
            sku: r.sku,
            category: r.category,
            description: r.description,
            price: r.price,
            discount: r.discount,
            stock: r.stock,
            min_stock: r.min_stock,
            image_url: r.image_url,
        }
    }
}

/// Body of `PATCH /api/products/{id}`. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub discount: Option<f64>,
    pub stock: Option<i64>,
    pub min_stock: Option<i64>,
    /// `""` removes the image.
    pub image_url: Option<String>,
}

impl From<UpdateProductRequest> for ProductUpdate {
    fn from(r: UpdateProductRequest) -> Self {
        ProductUpdate {
            name: r.name,
            sku: r.sku,
            category: r.category,
            description: r.description,
            price: r.price,
            discount: r.discount,
            stock: r.stock,
            min_stock: r.min_stock,
            image_url: r.image_url,
        }
    }
}

/// `GET /api/products`
pub async fn list_products(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> ApiResult<Json<Vec<ProductDto>>> {
    let products = state.db.products().list(&session).await?;
    Ok(Json(products.into_iter().map(ProductDto::from).collect()))
}

/// `GET /api/products/{id}`
pub async fn get_product(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ProductDto>> {
    let product = state
        .db
        .products()
        .get(&session, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;

    Ok(Json(product.into()))
}

/// `POST /api/products`
pub async fn create_product(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ProductDto>)> {
    let Json(request) = payload?;
    let product = state.db.products().insert(&session, &request.into()).await?;

    info!(user_id = %session.user_id, id = %product.id, sku = %product.sku, "Product created");
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// `PATCH /api/products/{id}`
pub async fn update_product(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> ApiResult<Json<ProductDto>> {
    let Json(request) = payload?;
    let update = ProductUpdate::from(request);
    let products = state.db.products();

    let previous_image = match update.image_url {
        Some(_) => products
            .get(&session, &id)
            .await?
            .and_then(|p| p.image_url),
        None => None,
    };

    let product = products.update(&session, &id, &update).await?;

    if let Some(old) = previous_image {
        if product.image_url.as_deref() != Some(old.as_str()) {
            discard_image(&state, &session, &old).await;
        }
    }

    Ok(Json(product.into()))
}

/// `DELETE /api/products/{id}`
///
/// The row goes first; a failure to remove the image afterwards is only
/// logged.
pub async fn delete_product(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let product = state.db.products().delete(&session, &id).await?;
    info!(user_id = %session.user_id, id = %product.id, "Product deleted");

    if let Some(url) = &product.image_url {
        discard_image(&state, &session, url).await;
    }

    Ok(StatusCode::NO_CONTENT)
}
