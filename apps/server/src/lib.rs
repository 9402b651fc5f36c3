//! # Stockly Server Library
//!
//! HTTP/JSON shell over `stockly-core` and `stockly-db`.
//!
//! ## Module Organization
//! ```text
//! stockly_server/
//! ├── lib.rs          ◄─── You are here (startup, router, shutdown)
//! ├── config.rs       ◄─── ServerConfig: TOML + STOCKLY_* env
//! ├── error.rs        ◄─── ApiError → status + JSON body
//! ├── session.rs      ◄─── x-user-id header → Session
//! ├── state.rs        ◄─── AppState shared by handlers
//! └── routes/
//!     ├── health.rs
//!     ├── product.rs
//!     ├── image.rs
//!     ├── invoice.rs
//!     └── dashboard.rs
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod state;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::ServerConfig;
use error::ServerError;
use state::AppState;
use stockly_db::{Database, DbConfig, LocalBlobStore};

/// Builds the full router: health, `/api`, and the image directory.
pub fn build_router(state: AppState) -> Router {
    let images = ServeDir::new(&state.config.storage.image_dir);
    let max_body_bytes = state.config.server.max_body_bytes;

    Router::new()
        .route("/health", get(routes::health::health))
        .nest("/api", routes::api_routes())
        .nest_service("/images", images)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs the server until Ctrl+C or SIGTERM.
///
/// ## Startup Sequence
/// ```text
/// 1. Open the database (SQLite, WAL) and apply migrations
/// 2. Create the image directory
/// 3. Bind the listener and serve
/// 4. On shutdown: finish in-flight requests, close the pool
/// ```
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    info!("Starting Stockly server");

    let db_config = DbConfig::new(config.database.path.clone())
        .max_connections(config.database.max_connections);
    let db = Database::new(db_config).await?;
    info!("Database connected and migrations applied");

    let blobs = LocalBlobStore::new(
        config.storage.image_dir.clone(),
        config.storage.public_base_url.clone(),
    );
    blobs.ensure_root().await?;
    info!(dir = %blobs.root().display(), "Image store ready");

    let bind_addr = config.server.bind_address();
    let state = AppState::new(db.clone(), Arc::new(blobs), config)?;
    let app = build_router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: bind_addr.clone(),
            source,
        })?;
    info!(addr = %bind_addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=stockly=trace` - Show trace for stockly crates only
/// - Default: INFO, DEBUG for stockly crates
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stockly=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}

// =============================================================================
// Router Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::session::USER_ID_HEADER;

    const EPS: f64 = 1e-9;

    async fn test_app() -> (Router, std::path::PathBuf) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut config = ServerConfig::default();
        config.storage.image_dir =
            std::env::temp_dir().join(format!("stockly-server-{}", Uuid::new_v4()));
        config.storage.public_base_url = "/images".into();

        let blobs = LocalBlobStore::new(
            config.storage.image_dir.clone(),
            config.storage.public_base_url.clone(),
        );
        let image_dir = config.storage.image_dir.clone();
        let state = AppState::new(db, Arc::new(blobs), config).unwrap();
        (build_router(state), image_dir)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn create_product(app: &Router, user: &str, sku: &str, stock: i64) -> Value {
        let (status, product) = send(
            app,
            "POST",
            "/api/products",
            Some(user),
            Some(json!({
                "name": "Widget",
                "sku": sku,
                "category": "Tools",
                "price": 100.0,
                "discount": 10.0,
                "stock": stock,
                "minStock": 2
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        product
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = test_app().await;
        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], true);
    }

    #[tokio::test]
    async fn test_api_requires_user_header() {
        let (app, _) = test_app().await;
        let (status, body) = send(&app, "GET", "/api/products", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_invoice_flow() {
        let (app, _) = test_app().await;
        let product = create_product(&app, "alice", "W-1", 5).await;
        let product_id = product["id"].as_str().unwrap().to_string();
        assert_eq!(product["finalPrice"], 90.0);

        let draft = json!({
            "customerName": "Ada Lovelace",
            "customerEmail": "ada@example.com",
            "items": [{ "inventoryItemId": product_id, "quantity": 2 }],
            "discountPercent": "5",
            "taxPercent": 8
        });

        // Quote prices the draft without touching stock
        let (status, quote) = send(&app, "POST", "/api/invoices/quote", Some("alice"), Some(draft.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert!((quote["subtotal"].as_f64().unwrap() - 180.0).abs() < EPS);
        assert!((quote["taxAmount"].as_f64().unwrap() - 13.68).abs() < EPS);
        assert!((quote["total"].as_f64().unwrap() - 184.68).abs() < EPS);
        assert_eq!(quote["formattedTotal"], "$184.68");

        let (status, invoice) = send(&app, "POST", "/api/invoices", Some("alice"), Some(draft)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(invoice["invoiceNumber"], "INV-00001");
        assert_eq!(invoice["status"], "draft");
        assert!((invoice["discount"].as_f64().unwrap() - 9.0).abs() < EPS);
        assert!((invoice["total"].as_f64().unwrap() - 184.68).abs() < EPS);
        assert_eq!(invoice["items"][0]["quantity"], 2);

        let uri = format!("/api/products/{}", product_id);
        let (_, product) = send(&app, "GET", &uri, Some("alice"), None).await;
        assert_eq!(product["stock"], 3);

        // More than what is left
        let (status, err) = send(
            &app,
            "POST",
            "/api/invoices",
            Some("alice"),
            Some(json!({
                "customerName": "Ada Lovelace",
                "items": [{ "inventoryItemId": product_id, "quantity": 4 }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], "INSUFFICIENT_STOCK");
        let (_, product) = send(&app, "GET", &uri, Some("alice"), None).await;
        assert_eq!(product["stock"], 3);

        // Unselected line
        let (status, err) = send(
            &app,
            "POST",
            "/api/invoices",
            Some("alice"),
            Some(json!({
                "customerName": "Ada Lovelace",
                "items": [{ "inventoryItemId": "", "quantity": 1 }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_ERROR");

        // Paid invoices feed the dashboard
        let invoice_uri = format!("/api/invoices/{}", invoice["id"].as_str().unwrap());
        let (status, paid) = send(&app, "PATCH", &invoice_uri, Some("alice"), Some(json!({ "status": "paid" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(paid["status"], "paid");

        let (status, err) = send(&app, "PATCH", &invoice_uri, Some("alice"), Some(json!({ "status": "draft" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], "INVALID_TRANSITION");

        let (status, dashboard) = send(&app, "GET", "/api/dashboard", Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!((dashboard["stats"]["totalRevenue"].as_f64().unwrap() - 184.68).abs() < EPS);
        assert_eq!(dashboard["stats"]["formattedRevenue"], "$184.68");
        assert_eq!(dashboard["stats"]["totalInvoices"], 1);
        assert_eq!(dashboard["stats"]["totalProducts"], 1);
        assert_eq!(dashboard["salesByProduct"][0]["totalQuantity"], 2);
        assert_eq!(dashboard["revenueByDate"].as_array().unwrap().len(), 1);

        let (status, _) = send(&app, "DELETE", &invoice_uri, Some("alice"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "GET", &invoice_uri, Some("alice"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_or_null_tax_is_not_taxed() {
        let (app, _) = test_app().await;
        let (status, product) = send(
            &app,
            "POST",
            "/api/products",
            Some("alice"),
            Some(json!({ "name": "Plain", "sku": "PL-1", "price": 100.0, "stock": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let product_id = product["id"].as_str().unwrap();

        let without_tax = json!({
            "customerName": "Ada Lovelace",
            "items": [{ "inventoryItemId": product_id, "quantity": 1 }]
        });
        let null_tax = json!({
            "customerName": "Ada Lovelace",
            "items": [{ "inventoryItemId": product_id, "quantity": 1 }],
            "taxPercent": null
        });

        for body in [without_tax, null_tax] {
            let (status, quote) = send(&app, "POST", "/api/invoices/quote", Some("alice"), Some(body.clone())).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(quote["taxAmount"], 0.0);
            assert!((quote["total"].as_f64().unwrap() - 100.0).abs() < EPS);
            // The configured default is offered to the form, not applied
            assert_eq!(quote["defaultTaxPercent"], 10.0);

            let (status, invoice) = send(&app, "POST", "/api/invoices", Some("alice"), Some(body)).await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(invoice["tax"], 0.0);
            assert!((invoice["total"].as_f64().unwrap() - 100.0).abs() < EPS);
        }
    }

    #[tokio::test]
    async fn test_create_rejects_cancelled_and_oversized_invoices() {
        let (app, _) = test_app().await;
        let product = create_product(&app, "alice", "W-1", 5).await;
        let product_id = product["id"].as_str().unwrap().to_string();
        let uri = format!("/api/products/{}", product_id);

        let (status, err) = send(
            &app,
            "POST",
            "/api/invoices",
            Some("alice"),
            Some(json!({
                "customerName": "Ada Lovelace",
                "items": [{ "inventoryItemId": product_id, "quantity": 2 }],
                "status": "cancelled"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_ERROR");
        let (_, product) = send(&app, "GET", &uri, Some("alice"), None).await;
        assert_eq!(product["stock"], 5);

        // Far past the line cap: a client error, never a database failure
        let lines: Vec<Value> = (0..5_000)
            .map(|i| json!({ "inventoryItemId": format!("missing-{i}"), "quantity": 1 }))
            .collect();
        let oversized = json!({ "customerName": "Ada Lovelace", "items": lines });
        for path in ["/api/invoices/quote", "/api/invoices"] {
            let (status, err) = send(&app, "POST", path, Some("alice"), Some(oversized.clone())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
            assert_eq!(err["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn test_activity_log() {
        let (app, _) = test_app().await;
        let product = create_product(&app, "alice", "W-1", 5).await;
        let product_id = product["id"].as_str().unwrap().to_string();

        let (status, invoice) = send(
            &app,
            "POST",
            "/api/invoices",
            Some("alice"),
            Some(json!({
                "customerName": "Ada Lovelace",
                "items": [{ "inventoryItemId": product_id, "quantity": 1 }],
                "paymentMethod": "card"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(invoice["paymentMethod"], "card");
        let invoice_id = invoice["id"].as_str().unwrap().to_string();

        let invoice_uri = format!("/api/invoices/{}", invoice_id);
        let (status, _) = send(&app, "PATCH", &invoice_uri, Some("alice"), Some(json!({ "status": "paid" }))).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "DELETE", &invoice_uri, Some("alice"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, log) = send(&app, "GET", "/api/activity", Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
        let actions: Vec<&str> = log
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["actionType"].as_str().unwrap())
            .collect();
        assert_eq!(actions, vec!["DELETE_INVOICE", "UPDATE_INVOICE", "ADD_INVOICE", "ADD_PRODUCT"]);
        assert_eq!(log[1]["description"], "Invoice INV-00001: draft → paid");

        let uri = format!("/api/activity?entityId={}&limit=1", product_id);
        let (status, log) = send(&app, "GET", &uri, Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(log.as_array().unwrap().len(), 1);
        assert_eq!(log[0]["actionType"], "ADD_PRODUCT");
        assert_eq!(log[0]["entityId"], product_id.as_str());

        let (_, log) = send(&app, "GET", "/api/activity", Some("bob"), None).await;
        assert!(log.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_products_are_per_owner() {
        let (app, _) = test_app().await;
        let product = create_product(&app, "alice", "W-1", 5).await;
        let uri = format!("/api/products/{}", product["id"].as_str().unwrap());

        let (status, _) = send(&app, "GET", &uri, Some("bob"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, list) = send(&app, "GET", "/api/products", Some("bob"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 0);

        // Same SKU is fine for another owner, not for the same one
        create_product(&app, "bob", "W-1", 1).await;
        let (status, err) = send(
            &app,
            "POST",
            "/api/products",
            Some("alice"),
            Some(json!({ "name": "Again", "sku": "W-1", "price": 1.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_product_update_and_bad_body() {
        let (app, _) = test_app().await;
        let product = create_product(&app, "alice", "W-1", 5).await;
        let uri = format!("/api/products/{}", product["id"].as_str().unwrap());

        let (status, updated) = send(&app, "PATCH", &uri, Some("alice"), Some(json!({ "stock": 2 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["stock"], 2);
        assert_eq!(updated["lowStock"], true);
        assert_eq!(updated["sku"], "W-1");

        let (status, err) = send(&app, "PATCH", &uri, Some("alice"), Some(json!({ "discount": 150 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_ERROR");

        let (status, err) = send(&app, "POST", "/api/products", Some("alice"), Some(json!({ "name": 3 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_image_lifecycle() {
        let (app, image_dir) = test_app().await;

        let request = Request::builder()
            .method("POST")
            .uri("/api/products/images?ext=png")
            .header(USER_ID_HEADER, "alice")
            .body(Body::from(&b"\x89PNG fake"[..]))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let uploaded: Value = serde_json::from_slice(&bytes).unwrap();
        let url = uploaded["url"].as_str().unwrap().to_string();
        assert!(url.starts_with("/images/alice-"));

        // Served back from the image directory
        let response = app
            .clone()
            .oneshot(Request::builder().uri(url.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"\x89PNG fake");

        let (status, product) = send(
            &app,
            "POST",
            "/api/products",
            Some("alice"),
            Some(json!({ "name": "Pic", "sku": "P-1", "price": 5.0, "imageUrl": url })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let file = image_dir.join(url.trim_start_matches("/images/"));
        assert!(file.exists());

        // Deleting the product removes its image
        let uri = format!("/api/products/{}", product["id"].as_str().unwrap());
        let (status, _) = send(&app, "DELETE", &uri, Some("alice"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(!file.exists());

        let (status, body) = send(
            &app,
            "DELETE",
            &format!("/api/products/images?url={}", url),
            Some("alice"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], false);

        tokio::fs::remove_dir_all(&image_dir).await.unwrap();
    }
}
