//! # Error Types
//!
//! Domain-specific error types for forecourt-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  forecourt-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Malformed event payloads                       │
//! │                                                                         │
//! │  forecourt-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  forecourt-ledger errors (separate crate)                              │
//! │  └── LedgerError      - What callers of the coordinator see            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (available vs. requested, ids)
//! 3. Errors are enum variants, never String
//! 4. A rejected operation leaves every entity unchanged - errors here
//!    always mean "nothing happened"

use rust_decimal::Decimal;
use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the costing engine and the ledger
/// invariant checks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Quantity is zero, negative where it must be positive, or otherwise
    /// unusable.
    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity { quantity: Decimal },

    /// Unit price must be non-negative.
    #[error("Invalid unit price: {price}")]
    InvalidUnitPrice { price: Money },

    /// Monetary amount is zero or negative where a positive amount is
    /// required.
    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: Money },

    /// A sale or negative adjustment would drive stock below zero.
    ///
    /// ## When This Occurs
    /// - Selling more than the tank holds
    /// - A dip-stick correction larger than the recorded stock
    ///
    /// The operation is rejected outright - quantities are never clamped.
    #[error("Insufficient stock: available {available}, requested {requested}")]
    InsufficientStock {
        available: Decimal,
        requested: Decimal,
    },

    /// A debit would drive an account balance below zero and policy
    /// forbids it.
    #[error("Insufficient funds in {account_id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account_id: String,
        balance: Money,
        requested: Money,
    },

    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Account cannot be found.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Supplier cannot be found.
    #[error("Supplier not found: {0}")]
    SupplierNotFound(String),

    /// Account exists but has been deactivated.
    #[error("Account is inactive: {0}")]
    AccountInactive(String),

    /// Optimistic-concurrency conflict survived the bounded retries.
    #[error("Concurrent modification of {entity} {id}")]
    ConcurrentModification { entity: String, id: String },

    /// The operation's reference was already consumed by an earlier,
    /// successfully applied operation. Replays must not double-apply.
    #[error("Duplicate reference: {kind} {id} already recorded")]
    DuplicateReference { kind: String, id: String },

    /// A reconciliation identity failed (e.g. due ≠ total − paid, or a
    /// cached balance disagrees with its log).
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Malformed event payloads, caught before business logic runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g. not a decimal, not an id).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            available: Decimal::from(1300),
            requested: Decimal::from(2000),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock: available 1300, requested 2000"
        );

        let err = CoreError::InsufficientFunds {
            account_id: "bank-1".into(),
            balance: Money::from_rupees(100),
            requested: Money::from_rupees(500),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds in bank-1: balance Rs 100.00, requested Rs 500.00"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "product_id".into(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
