//! # Validation Module
//!
//! Field-level validators shared by the event payloads.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Event payload (this module)                                  │
//! │  ├── Shape checks: ids present, quantities positive, notes bounded     │
//! │  └── Rejects before any store is touched                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Coordinator business rules                                   │
//! │  ├── Stock sufficiency, funds policy, account status                   │
//! │  └── Checked under the entity lock against fresh state                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database constraints                                         │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE reference pairs (idempotency)                              │
//! │  └── Foreign keys                                                      │
//! │                                                                         │
//! │  Defense in depth: each layer catches what the previous cannot see     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length for ids and reference keys.
pub const MAX_ID_LEN: usize = 64;

/// Maximum length for notes, reasons and categories.
pub const MAX_NOTE_LEN: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an entity id or reference key: non-empty, bounded length.
pub fn validate_id(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > MAX_ID_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_ID_LEN,
        });
    }

    Ok(())
}

/// Validates a free-text note/reason/category: bounded length. Emptiness
/// is the caller's concern (some notes are optional).
pub fn validate_note(field: &str, value: &str) -> ValidationResult<()> {
    if value.len() > MAX_NOTE_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NOTE_LEN,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a strictly positive quantity.
pub fn validate_positive_qty(field: &str, qty: Decimal) -> ValidationResult<()> {
    if qty <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a signed adjustment quantity: non-zero either way.
pub fn validate_signed_qty(field: &str, qty: Decimal) -> ValidationResult<()> {
    if qty.is_zero() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a strictly positive monetary amount.
pub fn validate_positive_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a non-negative monetary amount (zero allowed).
pub fn validate_non_negative_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("product_id", "prod-1").is_ok());
        assert!(validate_id("product_id", "  ").is_err());
        assert!(validate_id("product_id", &"x".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_note_length() {
        assert!(validate_note("reason", "evaporation loss").is_ok());
        assert!(validate_note("reason", &"x".repeat(501)).is_err());
    }

    #[test]
    fn test_quantity_validators() {
        assert!(validate_positive_qty("quantity", Decimal::from(5)).is_ok());
        assert!(validate_positive_qty("quantity", Decimal::ZERO).is_err());
        assert!(validate_positive_qty("quantity", Decimal::from(-5)).is_err());

        assert!(validate_signed_qty("quantity", Decimal::from(-5)).is_ok());
        assert!(validate_signed_qty("quantity", Decimal::ZERO).is_err());
    }

    #[test]
    fn test_amount_validators() {
        assert!(validate_positive_amount("amount", Money::from_rupees(1)).is_ok());
        assert!(validate_positive_amount("amount", Money::zero()).is_err());

        assert!(validate_non_negative_amount("unit_price", Money::zero()).is_ok());
        assert!(validate_non_negative_amount("unit_price", Money::from_rupees(-1)).is_err());
    }
}
