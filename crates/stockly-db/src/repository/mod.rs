//! # Repository Module
//!
//! Row store implementations for Stockly.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.invoices().create(&session, &input)                        │
//! │       ▼                                                                 │
//! │  InvoiceRepository                                                     │
//! │  ├── list / get (with line items)                                      │
//! │  ├── create ──► stockly-core reservation check ──► commit tx           │
//! │  ├── update (status, payment method, customer fields)                  │
//! │  └── delete                                                            │
//! │       │                                                                 │
//! │       │  every mutation also appends to activity_logs, same tx         │
//! │       │                                                                 │
//! │       │  SQL, always scoped by session.user_id                         │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Inventory item CRUD
//! - [`InvoiceRepository`](invoice::InvoiceRepository) - Invoices and line items
//! - [`ActivityRepository`](activity::ActivityRepository) - Activity log of product and invoice changes

pub mod activity;
pub mod invoice;
pub mod product;
