//! # forecourt-ledger: Coordinator and Reporting for the Forecourt Ledger
//!
//! The service layer of the Forecourt fuel-station ledger: the one writer
//! of balances and stock, plus the read-only reporting aggregator.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     forecourt-ledger (THIS CRATE)                       │
//! │                                                                         │
//! │   ┌──────────────┐  ┌───────────┐  ┌───────────┐  ┌──────────────┐    │
//! │   │ coordinator  │  │   locks   │  │  notify   │  │  reporting   │    │
//! │   │ record_*     │  │ per-entity│  │ broadcast │  │ window folds │    │
//! │   │ atomic ops   │  │ ordered   │  │ Entity-   │  │ reconcile    │    │
//! │   │ CAS retries  │  │ acquire   │  │ Changed   │  │ warnings     │    │
//! │   └──────┬───────┘  └───────────┘  └───────────┘  └──────┬───────┘    │
//! │          │                                               │            │
//! │          ▼ writes (one transaction per operation)        ▼ reads      │
//! │   ┌─────────────────────────────────────────────────────────────┐    │
//! │   │                      forecourt-db                           │    │
//! │   └─────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use forecourt_db::{Database, DbConfig};
//! use forecourt_ledger::{LedgerConfig, LedgerCoordinator};
//!
//! let db = Database::new(DbConfig::new("./forecourt.db")).await?;
//! let ledger = LedgerCoordinator::new(db.clone(), LedgerConfig::default());
//!
//! // UI gate for nozzle sales, then record
//! assert!(ledger.config().verify_admin_pin(&presented_pin));
//! let receipt = ledger.record_sale(sale_event).await?;
//!
//! // Subscribe for refresh events
//! let mut changes = ledger.change_hub().subscribe();
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod coordinator;
pub mod error;
pub mod locks;
pub mod notify;
pub mod reporting;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::LedgerConfig;
pub use coordinator::{
    AdjustmentReceipt, ExpenseReceipt, LedgerCoordinator, PurchaseReceipt, SaleReceipt,
    TransferReceipt,
};
pub use error::{LedgerError, LedgerResult};
pub use notify::{ChangeHub, EntityChanged, EntityKind};
pub use reporting::{
    AccountSummary, IntegrityWarning, LedgerReport, ProductSummary, ReportFilter,
    ReportWindow, ReportingAggregator,
};
