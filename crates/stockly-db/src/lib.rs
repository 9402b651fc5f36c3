//! # stockly-db: Storage Layer for Stockly
//!
//! Row storage (SQLite through sqlx) and blob storage (product images) for
//! the Stockly inventory and invoicing service.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockly Data Flow                                │
//! │                                                                         │
//! │  HTTP handler (POST /api/invoices)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    stockly-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  BlobStore   │  │   │
//! │  │   │   (pool.rs)   │    │               │    │ (storage.rs) │  │   │
//! │  │   │               │    │ ProductRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ InvoiceRepo   │    │ LocalBlob-   │  │   │
//! │  │   │ Migrations    │    │               │    │ Store        │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                               │                 │
//! │       ▼                                               ▼                 │
//! │  SQLite file (stockly.db)                     image directory          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Storage error types
//! - [`repository`] - Product, invoice and activity log repositories
//! - [`storage`] - Image blob store
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockly_core::Session;
//! use stockly_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("stockly.db")).await?;
//! let session = Session::new("user-1");
//!
//! let products = db.products().list(&session).await?;
//! let invoice = db.invoices().create(&session, &new_invoice).await?;
//! ```
//!
//! Every repository call takes the caller's [`stockly_core::Session`]; rows
//! owned by other users are invisible.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod storage;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use storage::{BlobStore, LocalBlobStore};

// Repository re-exports for convenience
pub use repository::activity::ActivityRepository;
pub use repository::invoice::InvoiceRepository;
pub use repository::product::ProductRepository;
