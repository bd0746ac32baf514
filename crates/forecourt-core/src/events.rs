//! # Ledger Events
//!
//! Closed, typed payloads for every business event the ledger can record.
//!
//! ## Why a Closed Enum?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Event Payload Flow                                 │
//! │                                                                         │
//! │  Order-entry UI / nozzle console                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  LedgerEvent::Sale(SaleEvent { .. })    ← typed, closed set            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  event.validate()                        ← rejects before any I/O      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  LedgerCoordinator::record_*             ← the only writer             │
//! │                                                                         │
//! │  Loose bags of fields between UI and data layer are where lost         │
//! │  updates and half-validated writes come from. The coordinator only     │
//! │  accepts these structs, fully validated.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each event carries a caller-supplied `reference` where idempotency
//! matters: the reference pair is unique in the logs, so replaying an
//! already-applied event fails with `DuplicateReference` instead of
//! double-applying.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::PaymentMethod;
use crate::validation::{
    validate_id, validate_non_negative_amount, validate_note, validate_positive_amount,
    validate_positive_qty, validate_signed_qty,
};

// =============================================================================
// Event Payloads
// =============================================================================

/// A stock purchase from a supplier, optionally part-paid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseEvent {
    /// Caller-supplied idempotency key; becomes the purchase order id.
    pub reference: String,
    pub product_id: String,
    pub supplier_id: String,
    /// Supplier invoice number, kept on the purchase order.
    pub invoice_number: String,
    pub quantity: Decimal,
    pub unit_price: Money,
    /// Account the paid portion is drawn from. Required when
    /// `paid_amount > 0`.
    pub account_id: Option<String>,
    /// Portion paid now; the remainder is owed to the supplier.
    pub paid_amount: Money,
    pub payment_method: PaymentMethod,
}

impl PurchaseEvent {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_id("reference", &self.reference)?;
        validate_id("product_id", &self.product_id)?;
        validate_id("supplier_id", &self.supplier_id)?;
        validate_id("invoice_number", &self.invoice_number)?;
        validate_positive_qty("quantity", self.quantity)?;
        validate_non_negative_amount("unit_price", self.unit_price)?;
        validate_non_negative_amount("paid_amount", self.paid_amount)?;

        let total = self.unit_price * self.quantity;
        if self.paid_amount > total {
            return Err(ValidationError::InvalidFormat {
                field: "paid_amount".into(),
                reason: "exceeds order total".into(),
            });
        }
        if self.paid_amount.is_positive() && self.account_id.is_none() {
            return Err(ValidationError::Required {
                field: "account_id".into(),
            });
        }
        if let Some(account_id) = &self.account_id {
            validate_id("account_id", account_id)?;
        }
        Ok(())
    }

    /// Order total: `unit_price × quantity`.
    #[inline]
    pub fn total_amount(&self) -> Money {
        self.unit_price * self.quantity
    }

    /// Unpaid remainder owed to the supplier.
    #[inline]
    pub fn due_amount(&self) -> Money {
        self.total_amount() - self.paid_amount
    }
}

/// A sale - a fuel nozzle reading or a counter sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleEvent {
    /// Caller-supplied idempotency key; becomes the sale record id.
    pub reference: String,
    pub product_id: String,
    /// Nozzle identifier for metered fuel sales.
    pub nozzle_id: Option<String>,
    pub quantity: Decimal,
    pub selling_price: Money,
    /// Account credited with the receipt.
    pub account_id: String,
    pub payment_method: PaymentMethod,
}

impl SaleEvent {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_id("reference", &self.reference)?;
        validate_id("product_id", &self.product_id)?;
        validate_id("account_id", &self.account_id)?;
        if let Some(nozzle_id) = &self.nozzle_id {
            validate_id("nozzle_id", nozzle_id)?;
        }
        validate_positive_qty("quantity", self.quantity)?;
        validate_non_negative_amount("selling_price", self.selling_price)?;
        Ok(())
    }

    /// Receipt total: `selling_price × quantity`.
    #[inline]
    pub fn sale_amount(&self) -> Money {
        self.selling_price * self.quantity
    }
}

/// A signed stock correction (dip-stick reading, spillage, evaporation).
/// Stock only - no money moves and the average cost stays put.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentEvent {
    /// Optional idempotency key.
    pub reference: Option<String>,
    pub product_id: String,
    /// Signed quantity: positive adds stock, negative removes it.
    pub quantity: Decimal,
    /// Why the correction was made; kept on the movement row.
    pub reason: String,
}

impl AdjustmentEvent {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(reference) = &self.reference {
            validate_id("reference", reference)?;
        }
        validate_id("product_id", &self.product_id)?;
        validate_signed_qty("quantity", self.quantity)?;
        validate_note("reason", &self.reason)?;
        if self.reason.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "reason".into(),
            });
        }
        Ok(())
    }
}

/// A business expense drawn from an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseEvent {
    /// Optional idempotency key.
    pub reference: Option<String>,
    pub account_id: String,
    pub amount: Money,
    /// Expense category ("electricity", "salaries", ...).
    pub category: String,
}

impl ExpenseEvent {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(reference) = &self.reference {
            validate_id("reference", reference)?;
        }
        validate_id("account_id", &self.account_id)?;
        validate_positive_amount("amount", self.amount)?;
        validate_note("category", &self.category)?;
        if self.category.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "category".into(),
            });
        }
        Ok(())
    }
}

/// Where transferred money lands: another account, or a supplier (paying
/// down what the business owes them).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum TransferDestination {
    Account(String),
    Supplier(String),
}

/// Money moved between two balances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferEvent {
    /// Optional idempotency key.
    pub reference: Option<String>,
    pub from_account_id: String,
    pub destination: TransferDestination,
    pub amount: Money,
}

impl TransferEvent {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(reference) = &self.reference {
            validate_id("reference", reference)?;
        }
        validate_id("from_account_id", &self.from_account_id)?;
        let destination_id = match &self.destination {
            TransferDestination::Account(id) => {
                validate_id("destination", id)?;
                id
            }
            TransferDestination::Supplier(id) => {
                validate_id("destination", id)?;
                id
            }
        };
        if matches!(&self.destination, TransferDestination::Account(_))
            && destination_id == &self.from_account_id
        {
            return Err(ValidationError::InvalidFormat {
                field: "destination".into(),
                reason: "cannot transfer an account to itself".into(),
            });
        }
        validate_positive_amount("amount", self.amount)?;
        Ok(())
    }
}

// =============================================================================
// The Closed Event Set
// =============================================================================

/// Every business event the ledger can record. Closed set - anything else
/// does not touch stock or money.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum LedgerEvent {
    Purchase(PurchaseEvent),
    Sale(SaleEvent),
    Adjustment(AdjustmentEvent),
    Expense(ExpenseEvent),
    Transfer(TransferEvent),
}

impl LedgerEvent {
    /// Validates the payload without touching any store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            LedgerEvent::Purchase(e) => e.validate(),
            LedgerEvent::Sale(e) => e.validate(),
            LedgerEvent::Adjustment(e) => e.validate(),
            LedgerEvent::Expense(e) => e.validate(),
            LedgerEvent::Transfer(e) => e.validate(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn purchase_event() -> PurchaseEvent {
        PurchaseEvent {
            reference: "po-1".into(),
            product_id: "prod-1".into(),
            supplier_id: "sup-1".into(),
            invoice_number: "INV-17".into(),
            quantity: Decimal::from(1000),
            unit_price: Money::from_rupees(100),
            account_id: Some("bank-1".into()),
            paid_amount: Money::from_rupees(60_000),
            payment_method: PaymentMethod::Bank,
        }
    }

    #[test]
    fn test_purchase_event_totals() {
        let event = purchase_event();
        assert_eq!(event.total_amount(), Money::from_rupees(100_000));
        assert_eq!(event.due_amount(), Money::from_rupees(40_000));
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_purchase_requires_account_when_paid() {
        let mut event = purchase_event();
        event.account_id = None;
        assert!(matches!(
            event.validate(),
            Err(ValidationError::Required { .. })
        ));

        // Fully on credit is fine without an account
        event.paid_amount = Money::zero();
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_purchase_rejects_overpayment() {
        let mut event = purchase_event();
        event.paid_amount = Money::from_rupees(200_000);
        assert!(matches!(
            event.validate(),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_sale_event_validation() {
        let event = SaleEvent {
            reference: "sale-1".into(),
            product_id: "prod-1".into(),
            nozzle_id: Some("nozzle-3".into()),
            quantity: Decimal::from(200),
            selling_price: Money::from_rupees(120),
            account_id: "cash-1".into(),
            payment_method: PaymentMethod::Cash,
        };
        assert!(event.validate().is_ok());
        assert_eq!(event.sale_amount(), Money::from_rupees(24_000));

        let bad = SaleEvent {
            quantity: Decimal::ZERO,
            ..event
        };
        assert!(matches!(
            bad.validate(),
            Err(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_adjustment_requires_reason() {
        let event = AdjustmentEvent {
            reference: None,
            product_id: "prod-1".into(),
            quantity: Decimal::from(-3),
            reason: "  ".into(),
        };
        assert!(matches!(
            event.validate(),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_transfer_rejects_self_transfer() {
        let event = TransferEvent {
            reference: None,
            from_account_id: "bank-1".into(),
            destination: TransferDestination::Account("bank-1".into()),
            amount: Money::from_rupees(500),
        };
        assert!(matches!(
            event.validate(),
            Err(ValidationError::InvalidFormat { .. })
        ));

        let to_supplier = TransferEvent {
            destination: TransferDestination::Supplier("sup-1".into()),
            ..event
        };
        assert!(to_supplier.validate().is_ok());
    }

    #[test]
    fn test_event_enum_dispatches_validation() {
        let event = LedgerEvent::Expense(ExpenseEvent {
            reference: None,
            account_id: "cash-1".into(),
            amount: Money::from_rupees(-5),
            category: "electricity".into(),
        });
        assert!(matches!(
            event.validate(),
            Err(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_event_serde_round_trip() {
        let event = LedgerEvent::Purchase(purchase_event());
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"purchase\""));
        let back: LedgerEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, LedgerEvent::Purchase(_)));
    }
}
