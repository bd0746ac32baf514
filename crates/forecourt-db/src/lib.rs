//! # forecourt-db: Database Layer for the Forecourt Ledger
//!
//! This crate provides database access for the Forecourt ledger.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Forecourt Data Flow                                │
//! │                                                                         │
//! │  Ledger operation (record_sale, record_purchase, ...)                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   forecourt-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (account.rs,  │    │  (embedded)  │  │   │
//! │  │   │               │    │  product.rs,  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│  movement.rs, │    │ 001_init.sql │  │   │
//! │  │   │ begin()/commit│    │  ...)         │    │ 002_idx.sql  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL mode)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation, configuration, transactions
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (account, product,
//!   supplier, movement, transaction, purchase, sale)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use forecourt_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/forecourt.db")).await?;
//!
//! // Reads borrow pool connections
//! let account = db.accounts().get_by_id("acct-1").await?;
//!
//! // Writes compose into one transaction
//! let mut tx = db.begin().await?;
//! db.movements().append(&mut tx, &movement).await?;
//! db.products().cas_update_costing(&mut tx, /* ... */).await?;
//! tx.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::account::AccountRepository;
pub use repository::movement::MovementRepository;
pub use repository::product::ProductRepository;
pub use repository::purchase::PurchaseOrderRepository;
pub use repository::sale::SaleRepository;
pub use repository::supplier::SupplierRepository;
pub use repository::transaction::TransactionRepository;
