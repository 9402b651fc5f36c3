//! # Seed Data Generator
//!
//! Populates the database with a small sample catalogue for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database for the default user
//! cargo run -p stockly-db --bin seed
//!
//! # Specify database path and owner
//! cargo run -p stockly-db --bin seed -- --db ./data/stockly.db --user alice
//! ```
//!
//! Products whose SKU the user already has are left alone, so running the
//! seed twice is harmless.

use std::env;

use stockly_core::{NewProduct, Session};
use stockly_db::{Database, DbConfig};

/// Sample catalogue:
/// (name, sku, category, description, price, discount %, stock, min stock)
const PRODUCTS: &[(&str, &str, &str, &str, f64, f64, i64, i64)] = &[
    (
        "Wireless Mouse",
        "WM-001",
        "Electronics",
        "Ergonomic wireless mouse with USB receiver",
        29.99,
        0.0,
        150,
        20,
    ),
    (
        "Mechanical Keyboard",
        "KB-002",
        "Electronics",
        "RGB mechanical keyboard with blue switches",
        89.99,
        10.0,
        75,
        15,
    ),
    (
        "USB-C Cable",
        "CB-003",
        "Accessories",
        "6ft USB-C to USB-C charging cable",
        12.99,
        0.0,
        200,
        50,
    ),
    (
        "Laptop Stand",
        "LS-004",
        "Accessories",
        "Adjustable aluminum laptop stand",
        45.99,
        15.0,
        45,
        10,
    ),
    (
        "Webcam HD",
        "WC-005",
        "Electronics",
        "1080p HD webcam with built-in microphone",
        69.99,
        5.0,
        30,
        10,
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./stockly_dev.db");
    let mut user_id = String::from("demo-user");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--user" | "-u" => {
                if i + 1 < args.len() {
                    user_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockly Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./stockly_dev.db)");
                println!("  -u, --user <ID>    Owner of the seeded products (default: demo-user)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Stockly Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("User:     {}", user_id);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let session = Session::new(user_id);

    println!("✓ Connected to database");
    println!("✓ Migrations applied");
    println!();

    let mut created = 0;
    for (name, sku, category, description, price, discount, stock, min_stock) in PRODUCTS {
        if db.products().get_by_sku(&session, sku).await?.is_some() {
            println!("  - {} already exists, skipping", sku);
            continue;
        }

        let product = NewProduct {
            name: name.to_string(),
            sku: sku.to_string(),
            category: category.to_string(),
            description: description.to_string(),
            price: *price,
            discount: *discount,
            stock: *stock,
            min_stock: *min_stock,
            image_url: None,
        };

        match db.products().insert(&session, &product).await {
            Ok(p) => {
                println!("  + {} ({})", p.name, p.sku);
                created += 1;
            }
            Err(e) => eprintln!("Failed to insert {}: {}", sku, e),
        }
    }

    let total = db.products().count(&session).await?;
    println!();
    println!("✓ Created {} products ({} total for {})", created, total, session.user_id);

    db.close().await;
    Ok(())
}
