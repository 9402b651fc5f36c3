//! # Product Repository
//!
//! Database operations for inventory items.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every statement carries `AND user_id = ?`                              │
//! │                                                                         │
//! │  Session { user_id: "alice" } ──► sees only alice's rows               │
//! │  Session { user_id: "bob" }   ──► get(alice's id) = None               │
//! │                                   delete(alice's id) = NotFound         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is only written here on create and explicit edits; invoice commits
//! decrement it in [`super::invoice`]. Each insert, update and delete appends
//! its activity entry in the same transaction.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::activity;
use stockly_core::validation::{validate_new_product, validate_product_update};
use stockly_core::{NewActivity, NewProduct, Product, ProductUpdate, Session};

const PRODUCT_COLUMNS: &str = "id, user_id, name, sku, category, description, price, discount, \
     stock, min_stock, image_url, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let session = Session::new("user-1");
///
/// let all = repo.list(&session).await?;
/// let one = repo.get(&session, "uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists the owner's products, newest first.
    pub async fn list(&self, session: &Session) -> DbResult<Vec<Product>> {
        debug!(user_id = %session.user_id, "Listing products");

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM inventory_items \
             WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(&session.user_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - No such product for this owner
    pub async fn get(&self, session: &Session, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM inventory_items WHERE id = ?1 AND user_id = ?2");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(&session.user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, session: &Session, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM inventory_items WHERE sku = ?1 AND user_id = ?2");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(sku.trim())
            .bind(&session.user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Fetches the owner's products among `ids`. Unknown ids are skipped.
    pub async fn get_many(&self, session: &Session, ids: &[&str]) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM inventory_items WHERE user_id = "
        ));
        query.push_bind(&session.user_id);
        query.push(" AND id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let products = query.build_query_as::<Product>().fetch_all(&self.pool).await?;
        Ok(products)
    }

    /// Creates a product owned by the session's user.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with generated id and timestamps
    /// * `Err(DbError::Rejected)` - Field validation failed
    /// * `Err(DbError::UniqueViolation)` - The owner already uses this SKU
    pub async fn insert(&self, session: &Session, input: &NewProduct) -> DbResult<Product> {
        validate_new_product(input)?;
        debug!(user_id = %session.user_id, sku = %input.sku, "Inserting product");

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            user_id: session.user_id.clone(),
            name: input.name.trim().to_string(),
            sku: input.sku.trim().to_string(),
            category: input.category.trim().to_string(),
            description: input.description.trim().to_string(),
            price: input.price,
            discount: input.discount,
            stock: input.stock,
            min_stock: input.min_stock,
            image_url: input.image_url.clone().filter(|url| !url.trim().is_empty()),
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO inventory_items (
                id, user_id, name, sku, category, description,
                price, discount, stock, min_stock, image_url,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&product.id)
        .bind(&product.user_id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.category)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.discount)
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(&product.image_url)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &product.sku),
            other => other,
        })?;

        activity::record(&mut *tx, session, NewActivity::product_added(&product)).await?;
        tx.commit().await?;

        Ok(product)
    }

    /// Applies a partial update and returns the updated product.
    ///
    /// `image_url: Some("")` clears the image.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No such product for this owner
    pub async fn update(&self, session: &Session, id: &str, update: &ProductUpdate) -> DbResult<Product> {
        validate_product_update(update)?;
        debug!(user_id = %session.user_id, id = %id, "Updating product");

        let mut product = self
            .get(session, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        if update.is_empty() {
            return Ok(product);
        }

        if let Some(name) = &update.name {
            product.name = name.trim().to_string();
        }
        if let Some(sku) = &update.sku {
            product.sku = sku.trim().to_string();
        }
        if let Some(category) = &update.category {
            product.category = category.trim().to_string();
        }
        if let Some(description) = &update.description {
            product.description = description.trim().to_string();
        }
        if let Some(price) = update.price {
            product.price = price;
        }
        if let Some(discount) = update.discount {
            product.discount = discount;
        }
        if let Some(stock) = update.stock {
            product.stock = stock;
        }
        if let Some(min_stock) = update.min_stock {
            product.min_stock = min_stock;
        }
        if let Some(url) = &update.image_url {
            product.image_url = Some(url.trim().to_string()).filter(|u| !u.is_empty());
        }
        product.updated_at = Utc::now();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE inventory_items SET
                name = ?3,
                sku = ?4,
                category = ?5,
                description = ?6,
                price = ?7,
                discount = ?8,
                stock = ?9,
                min_stock = ?10,
                image_url = ?11,
                updated_at = ?12
            WHERE id = ?1 AND user_id = ?2
            "#,
        )
        .bind(&product.id)
        .bind(&session.user_id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.category)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.discount)
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(&product.image_url)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &product.sku),
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        activity::record(&mut *tx, session, NewActivity::product_updated(&product)).await?;
        tx.commit().await?;

        Ok(product)
    }

    /// Deletes a product and returns the deleted row.
    ///
    /// Invoices that sold it keep their line item snapshots. The caller is
    /// responsible for removing the product image from the blob store.
    pub async fn delete(&self, session: &Session, id: &str) -> DbResult<Product> {
        debug!(user_id = %session.user_id, id = %id, "Deleting product");

        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "DELETE FROM inventory_items WHERE id = ?1 AND user_id = ?2 RETURNING {PRODUCT_COLUMNS}"
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(&session.user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        activity::record(&mut *tx, session, NewActivity::product_deleted(&product)).await?;
        tx.commit().await?;

        Ok(product)
    }

    /// Counts the owner's products.
    pub async fn count(&self, session: &Session) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory_items WHERE user_id = ?1")
            .bind(&session.user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
