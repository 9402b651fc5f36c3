//! # Activity Log Repository
//!
//! Reads the activity log and appends to it from inside other repositories'
//! transactions.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      SINGLE TRANSACTION                                 │
//! │                                                                         │
//! │  1. INSERT / UPDATE / DELETE the product or invoice                     │
//! │  2. INSERT INTO activity_logs (action_type, entity_id, description)     │
//! │                                                                         │
//! │  COMMIT ← the change and its log entry land together or not at all      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use stockly_core::{ActivityLog, NewActivity, Session};

const ACTIVITY_COLUMNS: &str = "id, user_id, action_type, entity_id, description, created_at";

/// Repository for reading the activity log.
#[derive(Debug, Clone)]
pub struct ActivityRepository {
    pool: SqlitePool,
}

impl ActivityRepository {
    /// Creates a new ActivityRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ActivityRepository { pool }
    }

    /// Lists the owner's most recent entries, newest first.
    ///
    /// ## Arguments
    /// * `entity_id` - Only entries about this product or invoice
    /// * `limit` - Maximum entries to return
    pub async fn list(
        &self,
        session: &Session,
        entity_id: Option<&str>,
        limit: i64,
    ) -> DbResult<Vec<ActivityLog>> {
        debug!(user_id = %session.user_id, entity_id = ?entity_id, limit, "Listing activity");

        let sql = format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activity_logs \
             WHERE user_id = ?1 AND (?2 IS NULL OR entity_id = ?2) \
             ORDER BY created_at DESC, rowid DESC LIMIT ?3"
        );
        let entries = sqlx::query_as::<_, ActivityLog>(&sql)
            .bind(&session.user_id)
            .bind(entity_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }
}

/// Appends an entry on `conn`, normally an open transaction.
pub(crate) async fn record(
    conn: &mut SqliteConnection,
    session: &Session,
    entry: NewActivity,
) -> DbResult<ActivityLog> {
    let log = ActivityLog {
        id: Uuid::new_v4().to_string(),
        user_id: session.user_id.clone(),
        action_type: entry.action,
        entity_id: entry.entity_id,
        description: entry.description,
        created_at: Utc::now(),
    };

    debug!(
        action = %log.action_type,
        entity_id = %log.entity_id,
        "Recording activity"
    );

    sqlx::query(
        r#"
        INSERT INTO activity_logs (
            id, user_id, action_type, entity_id, description, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&log.id)
    .bind(&log.user_id)
    .bind(log.action_type)
    .bind(&log.entity_id)
    .bind(&log.description)
    .bind(log.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(log)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use stockly_core::{
        ActivityAction, InvoiceStatus, InvoiceUpdate, LineItemInput, NewInvoice, NewProduct,
        ProductUpdate,
    };

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn mouse() -> NewProduct {
        NewProduct {
            name: "Wireless Mouse".into(),
            sku: "WM-001".into(),
            price: 29.99,
            stock: 10,
            ..Default::default()
        }
    }

    fn actions(entries: &[ActivityLog]) -> Vec<ActivityAction> {
        entries.iter().map(|e| e.action_type).collect()
    }

    #[tokio::test]
    async fn test_every_mutation_is_logged() {
        let db = db().await;
        let session = Session::new("alice");

        let p = db.products().insert(&session, &mouse()).await.unwrap();
        let update = ProductUpdate {
            price: Some(24.99),
            ..Default::default()
        };
        db.products().update(&session, &p.id, &update).await.unwrap();

        let input = NewInvoice {
            customer_name: "Ada Lovelace".into(),
            items: vec![LineItemInput::new(&p.id, 2)],
            ..Default::default()
        };
        let invoice = db.invoices().create(&session, &input).await.unwrap();
        db.invoices()
            .update(&session, &invoice.id, &InvoiceUpdate::status(InvoiceStatus::Paid))
            .await
            .unwrap();
        db.invoices().delete(&session, &invoice.id).await.unwrap();
        db.products().delete(&session, &p.id).await.unwrap();

        let log = db.activity().list(&session, None, 50).await.unwrap();
        assert_eq!(
            actions(&log),
            vec![
                ActivityAction::DeleteProduct,
                ActivityAction::DeleteInvoice,
                ActivityAction::UpdateInvoice,
                ActivityAction::AddInvoice,
                ActivityAction::UpdateProduct,
                ActivityAction::AddProduct,
            ]
        );
        assert_eq!(log[2].description, "Invoice INV-00001: draft → paid");
        assert_eq!(log[1].description, "Deleted invoice INV-00001");
        assert!(log.iter().all(|e| e.user_id == "alice"));
    }

    #[tokio::test]
    async fn test_rejected_changes_leave_no_entry() {
        let db = db().await;
        let session = Session::new("alice");
        let p = db.products().insert(&session, &mouse()).await.unwrap();

        // Duplicate SKU and an oversell both fail
        assert!(db.products().insert(&session, &mouse()).await.is_err());
        let input = NewInvoice {
            customer_name: "Ada Lovelace".into(),
            items: vec![LineItemInput::new(&p.id, 11)],
            ..Default::default()
        };
        assert!(db.invoices().create(&session, &input).await.is_err());

        let log = db.activity().list(&session, None, 50).await.unwrap();
        assert_eq!(actions(&log), vec![ActivityAction::AddProduct]);
    }

    #[tokio::test]
    async fn test_filter_limit_and_isolation() {
        let db = db().await;
        let alice = Session::new("alice");
        let a = db.products().insert(&alice, &mouse()).await.unwrap();
        let b = db
            .products()
            .insert(
                &alice,
                &NewProduct {
                    sku: "KB-002".into(),
                    ..mouse()
                },
            )
            .await
            .unwrap();

        let only_a = db.activity().list(&alice, Some(a.id.as_str()), 50).await.unwrap();
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a[0].entity_id, a.id);

        let newest = db.activity().list(&alice, None, 1).await.unwrap();
        assert_eq!(newest.len(), 1);
        assert_eq!(newest[0].entity_id, b.id);

        assert!(db.activity().list(&Session::new("bob"), None, 50).await.unwrap().is_empty());
    }
}
