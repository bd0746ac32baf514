//! # Ledger Error Types
//!
//! What callers of the coordinator and the reporting aggregator see.
//!
//! Every rejection means "nothing happened": a failed operation leaves no
//! movement row, no transaction row, and no balance change behind.

use thiserror::Error;

use forecourt_core::CoreError;
use forecourt_db::DbError;

/// Errors surfaced by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A business rule rejected the operation (insufficient stock or
    /// funds, bad quantities, unknown entities, replayed references,
    /// concurrency conflicts).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The storage layer failed in a way that is not a business rule
    /// (connection loss, corruption, migration problems).
    #[error(transparent)]
    Db(DbError),
}

impl From<DbError> for LedgerError {
    fn from(err: DbError) -> Self {
        LedgerError::Db(err)
    }
}

impl LedgerError {
    /// Whether this rejection is a business rule (retrying with the same
    /// inputs will fail again) rather than an infrastructure fault.
    pub fn is_business_rejection(&self) -> bool {
        matches!(self, LedgerError::Core(_))
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_core_errors_are_business_rejections() {
        let err: LedgerError = CoreError::InvalidQuantity {
            quantity: Decimal::ZERO,
        }
        .into();
        assert!(err.is_business_rejection());

        let err: LedgerError = DbError::PoolExhausted.into();
        assert!(!err.is_business_rejection());
    }
}
