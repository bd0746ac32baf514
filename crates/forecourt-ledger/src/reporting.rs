//! # Reporting Aggregator
//!
//! Read-only folds over the movement and transaction logs for a date
//! window.
//!
//! ## Read Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Reporting Aggregator                                │
//! │                                                                         │
//! │  INPUT:  [from, to] window + optional product / payment method /       │
//! │          supplier filters                                               │
//! │                                                                         │
//! │  OUTPUT: totals (sales, purchases, expenses, gross/net profit),        │
//! │          per-account opening→closing reconciliation,                   │
//! │          per-product volume/revenue/margin breakdown,                  │
//! │          integrity warnings                                             │
//! │                                                                         │
//! │  RULES:                                                                 │
//! │  • NEVER writes to any store                                           │
//! │  • A reconciliation mismatch (cached balance ≠ opening + Σ log) is     │
//! │    surfaced as a warning, never silently corrected and never a hard    │
//! │    failure - the report is diagnostic, not blocking                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use forecourt_core::types::{PaymentMethod, TransactionType};
use forecourt_core::Money;
use forecourt_db::Database;

use crate::error::LedgerResult;

// =============================================================================
// Report Shapes
// =============================================================================

/// Inclusive `[from, to]` reporting window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReportWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl ReportWindow {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        ReportWindow { from, to }
    }
}

/// Optional report filters. `None` means "all".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportFilter {
    pub product_id: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub supplier_id: Option<String>,
}

/// A data-integrity condition found while aggregating. Diagnostic, not
/// blocking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityWarning {
    pub entity: String,
    pub id: String,
    pub detail: String,
}

/// Opening→closing reconciliation for one account over the window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummary {
    pub account_id: String,
    pub name: String,
    /// Balance at the start of the window (opening balance plus all
    /// earlier transactions).
    pub opening_balance: Money,
    /// Net signed movement inside the window.
    pub window_delta: Money,
    /// `opening_balance + window_delta`.
    pub closing_balance: Money,
}

/// Volume/revenue/margin breakdown for one product over the window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSummary {
    pub product_id: String,
    pub name: String,
    pub volume: Decimal,
    pub revenue: Money,
    pub cogs: Money,
    pub gross_profit: Money,
}

/// The aggregated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerReport {
    pub window: ReportWindow,
    pub total_sales: Money,
    pub total_purchases: Money,
    pub total_expenses: Money,
    pub gross_profit: Money,
    /// `gross_profit − total_expenses`.
    pub net_profit: Money,
    pub accounts: Vec<AccountSummary>,
    pub products: Vec<ProductSummary>,
    pub warnings: Vec<IntegrityWarning>,
}

// =============================================================================
// Aggregator
// =============================================================================

/// Read-only aggregator over the ledger's logs.
#[derive(Debug, Clone)]
pub struct ReportingAggregator {
    db: Database,
}

impl ReportingAggregator {
    /// Creates an aggregator over an open database.
    pub fn new(db: Database) -> Self {
        ReportingAggregator { db }
    }

    /// Folds the logs over the window into a report.
    pub async fn summarize(
        &self,
        window: ReportWindow,
        filter: &ReportFilter,
    ) -> LedgerResult<LedgerReport> {
        debug!(from = %window.from, to = %window.to, "Building ledger report");

        let mut warnings = Vec::new();

        // --- Sales: totals and per-product breakdown -----------------------
        let sales = self
            .db
            .sales()
            .list_in_window(
                window.from,
                window.to,
                filter.product_id.as_deref(),
                filter.payment_method,
            )
            .await?;

        let mut total_sales = Money::zero();
        let mut gross_profit = Money::zero();
        let mut per_product: BTreeMap<String, ProductSummary> = BTreeMap::new();

        for sale in &sales {
            total_sales += sale.sale_amount;
            gross_profit += sale.gross_profit;

            let entry = per_product
                .entry(sale.product_id.clone())
                .or_insert_with(|| ProductSummary {
                    product_id: sale.product_id.clone(),
                    name: String::new(),
                    volume: Decimal::ZERO,
                    revenue: Money::zero(),
                    cogs: Money::zero(),
                    gross_profit: Money::zero(),
                });
            entry.volume += sale.quantity;
            entry.revenue += sale.sale_amount;
            entry.cogs += sale.cogs_per_unit * sale.quantity;
            entry.gross_profit += sale.gross_profit;
        }

        // Resolve product names (inactive products keep their id)
        for product in self.db.products().list_active().await? {
            if let Some(entry) = per_product.get_mut(&product.id) {
                entry.name = product.name;
            }
        }
        for entry in per_product.values_mut() {
            if entry.name.is_empty() {
                entry.name = entry.product_id.clone();
            }
        }

        // --- Purchases: totals and due-amount integrity ---------------------
        let orders = self
            .db
            .purchase_orders()
            .list_in_window(window.from, window.to, filter.supplier_id.as_deref())
            .await?;

        let mut total_purchases = Money::zero();
        for order in &orders {
            total_purchases += order.total_amount;
            if !order.due_is_consistent() {
                warn!(order_id = %order.id, "Purchase order due amount inconsistent");
                warnings.push(IntegrityWarning {
                    entity: "PurchaseOrder".into(),
                    id: order.id.clone(),
                    detail: format!(
                        "due {} != total {} - paid {}",
                        order.due_amount, order.total_amount, order.paid_amount
                    ),
                });
            }
        }

        // --- Expenses -------------------------------------------------------
        let window_transactions = self
            .db
            .transactions()
            .list_in_window(window.from, window.to)
            .await?;

        let total_expenses = window_transactions
            .iter()
            .filter(|t| t.transaction_type == TransactionType::Expense)
            .fold(Money::zero(), |sum, t| sum + t.amount);

        // --- Accounts: opening/closing reconciliation -----------------------
        let mut accounts = Vec::new();
        for account in self.db.accounts().list().await? {
            let history = self.db.transactions().list_for_account(&account.id).await?;

            let mut before_window = Money::zero();
            let mut window_delta = Money::zero();
            let mut full_history = Money::zero();

            for tx in &history {
                let Some(signed) = tx.signed_amount_for(&account.id) else {
                    continue;
                };
                full_history += signed;
                if tx.created_at < window.from {
                    before_window += signed;
                } else if tx.created_at <= window.to {
                    window_delta += signed;
                }
            }

            // Cached balance must equal opening + the full log; a mismatch
            // is surfaced, never corrected from here
            let expected = account.opening_balance + full_history;
            if expected != account.current_balance {
                warn!(
                    account_id = %account.id,
                    cached = %account.current_balance,
                    expected = %expected,
                    "Account balance disagrees with its transaction log"
                );
                warnings.push(IntegrityWarning {
                    entity: "Account".into(),
                    id: account.id.clone(),
                    detail: format!(
                        "cached balance {} != opening {} + transactions {}",
                        account.current_balance, account.opening_balance, full_history
                    ),
                });
            }

            let opening_balance = account.opening_balance + before_window;
            accounts.push(AccountSummary {
                account_id: account.id,
                name: account.name,
                opening_balance,
                window_delta,
                closing_balance: opening_balance + window_delta,
            });
        }

        let report = LedgerReport {
            window,
            total_sales,
            total_purchases,
            total_expenses,
            gross_profit,
            net_profit: gross_profit - total_expenses,
            accounts,
            products: per_product.into_values().collect(),
            warnings,
        };

        debug!(
            sales = %report.total_sales,
            purchases = %report.total_purchases,
            expenses = %report.total_expenses,
            warnings = report.warnings.len(),
            "Report built"
        );

        Ok(report)
    }
}
