//! # Setup Seed
//!
//! Creates the minimum working set for a fresh station database:
//! one cash account, one bank account, a supplier, and a small
//! fuel/lubricant catalog with opening stock.
//!
//! ## Usage
//! ```bash
//! # Seed the default database file
//! cargo run -p forecourt-db --bin seed
//!
//! # Specify database path
//! cargo run -p forecourt-db --bin seed -- --db ./data/forecourt.db
//! ```
//!
//! The seed is refusal-idempotent: it does nothing if the database
//! already has accounts.

use chrono::Utc;
use rust_decimal::Decimal;
use std::env;
use uuid::Uuid;

use forecourt_core::types::{
    Account, AccountStatus, AccountType, MovementType, Product, ProductType, StockMovement,
    Supplier,
};
use forecourt_core::Money;
use forecourt_db::{Database, DbConfig};

/// Opening catalog: (name, type, unit, stock, unit cost, min level,
/// tank capacity, selling price).
#[allow(clippy::type_complexity)]
const CATALOG: &[(&str, ProductType, &str, i64, i64, i64, Option<i64>, i64)] = &[
    (
        "Petrol (Super)",
        ProductType::Fuel,
        "litre",
        8_000,
        272,
        2_000,
        Some(20_000),
        285,
    ),
    (
        "High-Speed Diesel",
        ProductType::Fuel,
        "litre",
        10_000,
        278,
        2_500,
        Some(25_000),
        290,
    ),
    (
        "Hi-Octane 97",
        ProductType::Fuel,
        "litre",
        3_000,
        305,
        1_000,
        Some(10_000),
        322,
    ),
    (
        "Engine Oil 20W-50 4L",
        ProductType::OilLubricant,
        "bottle",
        120,
        2_400,
        30,
        None,
        2_950,
    ),
    (
        "Gear Oil 85W-140 1L",
        ProductType::OilLubricant,
        "bottle",
        80,
        950,
        20,
        None,
        1_200,
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug surfaces the repository-level tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./forecourt.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Forecourt Setup Seed");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./forecourt.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Forecourt Setup Seed");
    println!("=======================");
    println!("Database: {}", db_path);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Refuse to double-seed
    let existing = db.accounts().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} accounts", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    let mut tx = db.begin().await?;

    // Chart of accounts: one cash + one bank minimum
    let cash = Account {
        id: Uuid::new_v4().to_string(),
        account_type: AccountType::Cash,
        name: "Till".into(),
        opening_balance: Money::from_rupees(50_000),
        current_balance: Money::from_rupees(50_000),
        status: AccountStatus::Active,
        created_at: now,
        updated_at: now,
        version: 1,
    };
    let bank = Account {
        id: Uuid::new_v4().to_string(),
        account_type: AccountType::Bank,
        name: "Bank Current".into(),
        opening_balance: Money::from_rupees(1_500_000),
        current_balance: Money::from_rupees(1_500_000),
        status: AccountStatus::Active,
        created_at: now,
        updated_at: now,
        version: 1,
    };
    db.accounts().insert(&mut tx, &cash).await?;
    db.accounts().insert(&mut tx, &bank).await?;
    println!("✓ Accounts: {} / {}", cash.name, bank.name);

    let supplier = Supplier {
        id: Uuid::new_v4().to_string(),
        name: "PSO Depot".into(),
        account_balance: Money::zero(),
        is_active: true,
        created_at: now,
        updated_at: now,
        version: 1,
    };
    db.suppliers().insert(&mut tx, &supplier).await?;
    println!("✓ Supplier: {}", supplier.name);

    // Catalog with opening stock: each product gets an `initial` movement
    // so the cached costing fields and the log agree from day one.
    for (name, product_type, unit, stock, unit_cost, min_level, capacity, price) in CATALOG {
        let stock = Decimal::from(*stock);
        let unit_cost = Money::from_rupees(*unit_cost);

        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: (*name).into(),
            product_type: *product_type,
            unit: (*unit).into(),
            current_stock: stock,
            weighted_avg_cost: unit_cost,
            minimum_stock_level: Decimal::from(*min_level),
            tank_capacity: (*capacity).map(Decimal::from),
            selling_price: Money::from_rupees(*price),
            stock_value: unit_cost * stock,
            is_active: true,
            created_at: now,
            updated_at: now,
            version: 1,
        };
        db.products().insert(&mut tx, &product).await?;

        let movement = StockMovement {
            id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            movement_type: MovementType::Initial,
            quantity: stock,
            unit_price: unit_cost,
            avg_cost_after: unit_cost,
            balance_after: stock,
            reference: None,
            note: Some("opening stock".into()),
            created_at: now,
        };
        db.movements().append(&mut tx, &movement).await?;

        println!("  + {} ({} {})", product.name, stock, product.unit);
    }

    tx.commit().await?;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
