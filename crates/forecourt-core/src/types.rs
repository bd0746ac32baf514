//! # Domain Types
//!
//! Core domain types used throughout the Forecourt ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Account      │   │    Product      │   │    Supplier     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  cash | bank    │   │  current_stock  │   │  account_balance│       │
//! │  │  current_balance│   │  weighted_avg   │   │  (owed by us)   │       │
//! │  │  version (CAS)  │   │  version (CAS)  │   │  version (CAS)  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  StockMovement  │   │LedgerTransaction│   │  PurchaseOrder  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │    SaleRecord   │       │
//! │  │  append-only    │   │  append-only    │   │  ─────────────  │       │
//! │  │  one per stock  │   │  one per money  │   │  business events│       │
//! │  │  mutation       │   │  mutation       │   │  behind the logs│       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Caches vs. Logs
//! `current_balance`, `current_stock` and `stock_value` are materialized
//! views over the append-only logs. They are only ever updated in the same
//! unit of work as the log append they summarize.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Account
// =============================================================================

/// The kind of a cash-like account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Physical cash drawer.
    Cash,
    /// Bank account.
    Bank,
}

impl AccountType {
    /// Stable string form used in storage and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Cash => "cash",
            AccountType::Bank => "bank",
        }
    }

    /// Parses the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(AccountType::Cash),
            "bank" => Some(AccountType::Bank),
            _ => None,
        }
    }
}

/// Account lifecycle status. Accounts are never deleted, only deactivated,
/// because the transaction log references them forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(AccountStatus::Active),
            "inactive" => Some(AccountStatus::Inactive),
            _ => None,
        }
    }
}

/// A cash-like account with a cached current balance.
///
/// Invariant: `current_balance == opening_balance + Σ(signed amounts of all
/// transactions referencing this account)`. The ledger coordinator is the
/// only writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Cash or bank.
    pub account_type: AccountType,

    /// Display name ("Till", "HBL Current", ...).
    pub name: String,

    /// Balance at account creation; the anchor for reconciliation.
    pub opening_balance: Money,

    /// Cached balance, maintained transactionally with the log.
    pub current_balance: Money,

    /// Active or deactivated.
    pub status: AccountStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Optimistic-concurrency version, bumped on every balance change.
    pub version: i64,
}

impl Account {
    /// Whether the account can take part in new operations.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Whether a debit of `amount` is allowed under the given policy.
    pub fn can_debit(&self, amount: Money, allow_negative: bool) -> bool {
        allow_negative || self.current_balance >= amount
    }
}

// =============================================================================
// Product
// =============================================================================

/// Product category. Fuel lives in tanks and is metered through nozzles;
/// lubricants are shelf goods. Both share the same costing model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Fuel,
    OilLubricant,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Fuel => "fuel",
            ProductType::OilLubricant => "oil_lubricant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fuel" => Some(ProductType::Fuel),
            "oil_lubricant" => Some(ProductType::OilLubricant),
            _ => None,
        }
    }
}

/// A sellable product with cached costing fields.
///
/// Catalog attributes (name, unit, minimum level, tank capacity, selling
/// price) belong to catalog management. The costing fields
/// (`current_stock`, `weighted_avg_cost`, `stock_value`) are written only
/// by the ledger coordinator, always together, always alongside a
/// [`StockMovement`] append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name ("Hi-Octane 97", "20W-50 4L", ...).
    pub name: String,

    /// Fuel or lubricant.
    pub product_type: ProductType,

    /// Unit of measure ("litre", "bottle", ...).
    pub unit: String,

    /// Current stock quantity. Never negative.
    pub current_stock: Decimal,

    /// Quantity-weighted mean unit cost, perturbed only by purchases.
    pub weighted_avg_cost: Money,

    /// Reorder threshold for low-stock warnings.
    pub minimum_stock_level: Decimal,

    /// Tank capacity in units; fuel products only.
    pub tank_capacity: Option<Decimal>,

    /// Current selling price per unit.
    pub selling_price: Money,

    /// Derived: `current_stock × weighted_avg_cost`. Recomputed in the
    /// same atomic step as the fields it derives from.
    pub stock_value: Money,

    /// Whether the product is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Optimistic-concurrency version, bumped on every costing change.
    pub version: i64,
}

impl Product {
    /// Whether stock has fallen to or below the reorder threshold.
    #[inline]
    pub fn is_below_minimum(&self) -> bool {
        self.current_stock <= self.minimum_stock_level
    }

    /// Whether a purchase of `qty` would overflow the tank (fuel only).
    pub fn exceeds_capacity(&self, qty: Decimal) -> bool {
        match self.tank_capacity {
            Some(capacity) => self.current_stock + qty > capacity,
            None => false,
        }
    }
}

// =============================================================================
// Stock Movement (append-only)
// =============================================================================

/// Why a stock quantity changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Purchase,
    Sale,
    Initial,
    Adjustment,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Purchase => "purchase",
            MovementType::Sale => "sale",
            MovementType::Initial => "initial",
            MovementType::Adjustment => "adjustment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "purchase" => Some(MovementType::Purchase),
            "sale" => Some(MovementType::Sale),
            "initial" => Some(MovementType::Initial),
            "adjustment" => Some(MovementType::Adjustment),
            _ => None,
        }
    }
}

/// The kind of business record a movement or transaction points back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    PurchaseOrder,
    Sale,
    Expense,
    Transfer,
    Adjustment,
}

impl RefKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefKind::PurchaseOrder => "purchase_order",
            RefKind::Sale => "sale",
            RefKind::Expense => "expense",
            RefKind::Transfer => "transfer",
            RefKind::Adjustment => "adjustment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "purchase_order" => Some(RefKind::PurchaseOrder),
            "sale" => Some(RefKind::Sale),
            "expense" => Some(RefKind::Expense),
            "transfer" => Some(RefKind::Transfer),
            "adjustment" => Some(RefKind::Adjustment),
            _ => None,
        }
    }
}

/// Reference to the originating business event.
///
/// The pair is unique across each log, which is what makes replaying an
/// already-applied operation fail instead of double-applying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRef {
    pub kind: RefKind,
    pub id: String,
}

impl EventRef {
    pub fn new(kind: RefKind, id: impl Into<String>) -> Self {
        EventRef { kind, id: id.into() }
    }
}

/// One append-only record of a stock quantity change.
///
/// One row per mutation of `Product.current_stock`; never updated or
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub movement_type: MovementType,

    /// Signed quantity: positive for purchases/additions, negative for
    /// sales/reductions.
    pub quantity: Decimal,

    /// Unit price at the time of the movement (purchase price for
    /// purchases, selling price for sales, zero for adjustments).
    pub unit_price: Money,

    /// Weighted-average cost after this movement was applied.
    pub avg_cost_after: Money,

    /// Stock quantity after this movement was applied.
    pub balance_after: Decimal,

    /// Originating order / sale, when there is one.
    pub reference: Option<EventRef>,

    /// Free-text note (adjustment reason etc.).
    pub note: Option<String>,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Ledger Transaction (append-only)
// =============================================================================

/// Why money moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    PurchasePayment,
    SaleReceipt,
    Expense,
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::PurchasePayment => "purchase_payment",
            TransactionType::SaleReceipt => "sale_receipt",
            TransactionType::Expense => "expense",
            TransactionType::Transfer => "transfer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "purchase_payment" => Some(TransactionType::PurchasePayment),
            "sale_receipt" => Some(TransactionType::SaleReceipt),
            "expense" => Some(TransactionType::Expense),
            "transfer" => Some(TransactionType::Transfer),
            _ => None,
        }
    }
}

/// One append-only record of a money movement.
///
/// `amount` is a positive magnitude; the sign an account sees is derived
/// from direction (`from_account_id` pays, `to_account_id` receives). A
/// transfer produces exactly one row touching two balances; a simple
/// payment or receipt touches one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub id: String,
    pub transaction_type: TransactionType,

    /// Positive magnitude of the movement.
    pub amount: Money,

    /// Account debited, when one is.
    pub from_account_id: Option<String>,

    /// Account credited, when one is.
    pub to_account_id: Option<String>,

    /// Supplier credited (transfer against what we owe them).
    pub supplier_id: Option<String>,

    /// Originating purchase order / sale / expense.
    pub reference: Option<EventRef>,

    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl LedgerTransaction {
    /// The signed amount this transaction contributes to `account_id`'s
    /// balance, or `None` if the account is not referenced.
    ///
    /// This is the folding rule behind the reconciliation invariant:
    /// `current_balance == opening_balance + Σ signed_amount_for(account)`.
    pub fn signed_amount_for(&self, account_id: &str) -> Option<Money> {
        if self.from_account_id.as_deref() == Some(account_id) {
            Some(-self.amount)
        } else if self.to_account_id.as_deref() == Some(account_id) {
            Some(self.amount)
        } else {
            None
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was received or a purchase was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Straight into the cash drawer.
    Cash,
    /// Bank deposit / card settlement.
    Bank,
    /// On account - nothing received yet.
    Credit,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Bank => "bank",
            PaymentMethod::Credit => "credit",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "bank" => Some(PaymentMethod::Bank),
            "credit" => Some(PaymentMethod::Credit),
            _ => None,
        }
    }
}

// =============================================================================
// Purchase Order
// =============================================================================

/// A supplier purchase. `due_amount` must equal `total_amount -
/// paid_amount` at all times; [`PurchaseOrder::verify_due`] enforces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: String,
    pub supplier_id: String,
    pub invoice_number: String,
    pub total_amount: Money,
    pub paid_amount: Money,
    pub due_amount: Money,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

impl PurchaseOrder {
    /// Checks the due-amount identity. A mismatch is a data-integrity
    /// condition, not a rounding artifact - the three fields are written
    /// together.
    pub fn due_is_consistent(&self) -> bool {
        self.due_amount == self.total_amount - self.paid_amount
    }
}

/// A line item on a purchase order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity: Decimal,
    pub unit_price: Money,
    pub line_total: Money,
}

// =============================================================================
// Sale Record
// =============================================================================

/// A sale (fuel nozzle reading or counter sale) with its cost snapshot.
///
/// `cogs_per_unit` freezes the weighted-average cost at sale time. Later
/// purchases change the average for *future* sales only; history is never
/// recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: String,
    pub product_id: String,

    /// Nozzle identifier for metered fuel sales.
    pub nozzle_id: Option<String>,

    pub quantity: Decimal,
    pub selling_price: Money,

    /// `selling_price × quantity`.
    pub sale_amount: Money,

    /// Weighted-average cost at the moment of sale (snapshot).
    pub cogs_per_unit: Money,

    /// `sale_amount − cogs_per_unit × quantity`.
    pub gross_profit: Money,

    pub payment_method: PaymentMethod,
    pub account_id: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Supplier
// =============================================================================

/// A fuel/lubricant supplier and the amount the business owes them.
///
/// `account_balance` rises by the unpaid remainder of purchases and falls
/// by transfers recorded against the supplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub account_balance: Money,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Optimistic-concurrency version, bumped on every balance change.
    pub version: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer_row() -> LedgerTransaction {
        LedgerTransaction {
            id: "tx-1".into(),
            transaction_type: TransactionType::Transfer,
            amount: Money::from_rupees(500),
            from_account_id: Some("bank-1".into()),
            to_account_id: Some("cash-1".into()),
            supplier_id: None,
            reference: None,
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_signed_amount_direction() {
        let tx = transfer_row();
        assert_eq!(
            tx.signed_amount_for("bank-1"),
            Some(Money::from_rupees(-500))
        );
        assert_eq!(tx.signed_amount_for("cash-1"), Some(Money::from_rupees(500)));
        assert_eq!(tx.signed_amount_for("other"), None);
    }

    #[test]
    fn test_enum_string_round_trips() {
        for ty in [
            TransactionType::PurchasePayment,
            TransactionType::SaleReceipt,
            TransactionType::Expense,
            TransactionType::Transfer,
        ] {
            assert_eq!(TransactionType::parse(ty.as_str()), Some(ty));
        }
        for mv in [
            MovementType::Purchase,
            MovementType::Sale,
            MovementType::Initial,
            MovementType::Adjustment,
        ] {
            assert_eq!(MovementType::parse(mv.as_str()), Some(mv));
        }
        assert_eq!(AccountType::parse("cash"), Some(AccountType::Cash));
        assert_eq!(AccountType::parse("nope"), None);
    }

    #[test]
    fn test_due_consistency() {
        let order = PurchaseOrder {
            id: "po-1".into(),
            supplier_id: "sup-1".into(),
            invoice_number: "INV-001".into(),
            total_amount: Money::from_rupees(100_000),
            paid_amount: Money::from_rupees(60_000),
            due_amount: Money::from_rupees(40_000),
            payment_method: PaymentMethod::Bank,
            created_at: Utc::now(),
        };
        assert!(order.due_is_consistent());

        let broken = PurchaseOrder {
            due_amount: Money::from_rupees(10),
            ..order
        };
        assert!(!broken.due_is_consistent());
    }

    #[test]
    fn test_tank_capacity_check() {
        let product = Product {
            id: "p-1".into(),
            name: "Petrol".into(),
            product_type: ProductType::Fuel,
            unit: "litre".into(),
            current_stock: Decimal::from(9_000),
            weighted_avg_cost: Money::from_rupees(100),
            minimum_stock_level: Decimal::from(1_000),
            tank_capacity: Some(Decimal::from(10_000)),
            selling_price: Money::from_rupees(110),
            stock_value: Money::from_rupees(900_000),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            version: 1,
        };
        assert!(!product.exceeds_capacity(Decimal::from(1_000)));
        assert!(product.exceeds_capacity(Decimal::from(1_001)));
        assert!(!product.is_below_minimum());
    }
}
