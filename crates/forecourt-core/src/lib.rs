//! # forecourt-core: Pure Business Logic for the Forecourt Ledger
//!
//! This crate is the **heart** of the Forecourt fuel-station ledger. It
//! contains all business logic as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Forecourt Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Dashboard UI / order entry / nozzle console          │   │
//! │  │                      (external, out of crate)                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ typed LedgerEvent payloads             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              forecourt-ledger (coordinator crate)               │   │
//! │  │    record_purchase, record_sale, record_adjustment, ...         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ forecourt-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  costing  │  │  events   │  │   │
//! │  │   │  Account  │  │   Money   │  │ wtd. avg  │  │ Purchase  │  │   │
//! │  │   │  Product  │  │  Decimal  │  │ COGS snap │  │ Sale ...  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 forecourt-db (Database Layer)                   │   │
//! │  │           SQLite stores, append-only logs, migrations           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Account, Product, StockMovement, ...)
//! - [`money`] - Money type over exact decimal arithmetic
//! - [`costing`] - Weighted-average costing engine
//! - [`events`] - Closed set of typed business-event payloads
//! - [`error`] - Domain error types
//! - [`validation`] - Event payload validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input =
//!    same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Decimal Arithmetic**: All quantities and money are
//!    `rust_decimal::Decimal` - floats never touch the books
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use forecourt_core::costing;
//! use forecourt_core::money::Money;
//! use rust_decimal::Decimal;
//!
//! // Empty tank, buy 1000 L @ Rs 100, then 500 L @ Rs 110
//! let first = costing::apply_purchase(
//!     Decimal::ZERO,
//!     Money::zero(),
//!     Decimal::from(1000),
//!     Money::from_rupees(100),
//! ).unwrap();
//!
//! let second = costing::apply_purchase(
//!     first.new_stock,
//!     first.new_avg_cost,
//!     Decimal::from(500),
//!     Money::from_rupees(110),
//! ).unwrap();
//!
//! assert_eq!(second.new_avg_cost.rounded(), "103.33".parse().unwrap());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod costing;
pub mod error;
pub mod events;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use forecourt_core::Money` instead of
// `use forecourt_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use events::{
    AdjustmentEvent, ExpenseEvent, LedgerEvent, PurchaseEvent, SaleEvent, TransferDestination,
    TransferEvent,
};
pub use money::Money;
pub use types::*;
