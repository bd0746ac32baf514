//! # Ledger Coordinator
//!
//! The ONLY component allowed to mutate account balances, supplier
//! balances and product costing fields. One operation per business event
//! type, each applied atomically.
//!
//! ## Operation Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Pending → Validated → Applied                           │
//! │                        └─► Rejected (no side effect)                    │
//! │                                                                         │
//! │  1. VALIDATE    event.validate() - shape checks, no I/O                │
//! │  2. LOCK        per-entity locks, ascending global order               │
//! │  3. READ        fresh entity state (versions noted)                    │
//! │  4. COMPUTE     pure costing math (forecourt-core)                     │
//! │  5. WRITE       one sqlite transaction:                                │
//! │                   CAS balance/costing updates (WHERE version = ?)      │
//! │                   append-only log rows (unique reference guard)        │
//! │                   business record (order / sale)                       │
//! │  6. COMMIT      all-or-nothing; a CAS miss rolls back and retries     │
//! │                 (bounded), then surfaces ConcurrentModification        │
//! │  7. NOTIFY      EntityChanged events for every touched entity          │
//! │                                                                         │
//! │  A caller never observes a half-applied state: other operations       │
//! │  serialize on the entity locks, and readers see either the previous    │
//! │  commit or the new one.                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Operations are synchronous from the caller's perspective and are not
//! cancellable mid-flight; there are no internal timers. The bounded CAS
//! retry is the only automatic retry in the ledger.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use forecourt_core::costing;
use forecourt_core::types::{
    Account, EventRef, LedgerTransaction, MovementType, Product, PurchaseLine, PurchaseOrder,
    RefKind, SaleRecord, StockMovement, Supplier, TransactionType,
};
use forecourt_core::{
    AdjustmentEvent, CoreError, ExpenseEvent, Money, PurchaseEvent, SaleEvent,
    TransferDestination, TransferEvent,
};
use forecourt_db::{Database, DbError};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::locks::{LockKey, LockRegistry};
use crate::notify::{ChangeHub, EntityChanged};

// =============================================================================
// Receipts
// =============================================================================

/// Result of a successfully recorded purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub order_id: String,
    pub movement_id: String,
    /// Present when `paid_amount > 0`.
    pub transaction_id: Option<String>,
    pub new_stock: Decimal,
    pub new_avg_cost: Money,
}

/// Result of a successfully recorded sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleReceipt {
    pub sale_id: String,
    pub movement_id: String,
    pub transaction_id: String,
    pub new_stock: Decimal,
    /// Weighted-average cost snapshot the sale was costed at (2 dp).
    pub cogs_per_unit: Money,
    pub gross_profit: Money,
}

/// Result of a successfully recorded adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentReceipt {
    pub movement_id: String,
    pub new_stock: Decimal,
}

/// Result of a successfully recorded expense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseReceipt {
    pub transaction_id: String,
    pub new_balance: Money,
}

/// Result of a successfully recorded transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub transaction_id: String,
    pub from_balance: Money,
    /// New destination balance: account balance, or supplier payable.
    pub destination_balance: Money,
}

/// Outcome of one write attempt: applied, or lost a version race.
enum Attempt<T> {
    Applied(T),
    Conflict { entity: &'static str, id: String },
}

// =============================================================================
// Coordinator
// =============================================================================

/// The single writer of the ledger.
///
/// Clone-cheap (pool handles and Arc-backed locks); share one instance
/// across tasks.
#[derive(Clone)]
pub struct LedgerCoordinator {
    db: Database,
    config: LedgerConfig,
    locks: std::sync::Arc<LockRegistry>,
    hub: ChangeHub,
}

impl LedgerCoordinator {
    /// Creates a coordinator over an open database.
    pub fn new(db: Database, config: LedgerConfig) -> Self {
        LedgerCoordinator {
            db,
            config,
            locks: std::sync::Arc::new(LockRegistry::new()),
            hub: ChangeHub::new(),
        }
    }

    /// The change-notification hub; subscribe for refresh events.
    pub fn change_hub(&self) -> &ChangeHub {
        &self.hub
    }

    /// The active configuration (policy flags, PIN gate).
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// The underlying database handle (read paths, reporting).
    pub fn database(&self) -> &Database {
        &self.db
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Records a stock purchase: costing update + movement append +
    /// purchase order, plus the paid portion leaving an account and the
    /// unpaid remainder landing on the supplier's payable balance.
    pub async fn record_purchase(&self, event: PurchaseEvent) -> LedgerResult<PurchaseReceipt> {
        event.validate().map_err(CoreError::from)?;
        debug!(reference = %event.reference, product_id = %event.product_id, "Purchase validated");

        let mut keys = vec![
            LockKey::product(&event.product_id),
            LockKey::supplier(&event.supplier_id),
        ];
        if let Some(account_id) = &event.account_id {
            if event.paid_amount.is_positive() {
                keys.push(LockKey::account(account_id));
            }
        }
        let _guards = self.locks.acquire_many(keys).await;

        let receipt = self
            .retry_loop("purchase", |attempt| {
                debug!(reference = %event.reference, attempt, "Applying purchase");
                self.try_purchase(&event)
            })
            .await?;

        info!(
            order_id = %receipt.order_id,
            product_id = %event.product_id,
            quantity = %event.quantity,
            new_stock = %receipt.new_stock,
            new_avg_cost = %receipt.new_avg_cost,
            "Purchase recorded"
        );

        let mut events = vec![
            EntityChanged::product(&event.product_id),
            EntityChanged::supplier(&event.supplier_id),
        ];
        if let (Some(account_id), Some(_)) = (&event.account_id, &receipt.transaction_id) {
            events.push(EntityChanged::account(account_id));
        }
        self.hub.publish_all(events);

        Ok(receipt)
    }

    /// Records a sale: stock deduction with COGS snapshot, receipt into
    /// the payment-method account, and the sale row with gross profit.
    ///
    /// For fuel nozzle readings the caller must have passed the admin-PIN
    /// gate ([`LedgerConfig::verify_admin_pin`]) before invoking this; the
    /// coordinator trusts that check.
    pub async fn record_sale(&self, event: SaleEvent) -> LedgerResult<SaleReceipt> {
        event.validate().map_err(CoreError::from)?;
        debug!(reference = %event.reference, product_id = %event.product_id, "Sale validated");

        let _guards = self
            .locks
            .acquire_many(vec![
                LockKey::product(&event.product_id),
                LockKey::account(&event.account_id),
            ])
            .await;

        let receipt = self
            .retry_loop("sale", |attempt| {
                debug!(reference = %event.reference, attempt, "Applying sale");
                self.try_sale(&event)
            })
            .await?;

        info!(
            sale_id = %receipt.sale_id,
            product_id = %event.product_id,
            quantity = %event.quantity,
            gross_profit = %receipt.gross_profit,
            "Sale recorded"
        );

        self.hub.publish_all([
            EntityChanged::product(&event.product_id),
            EntityChanged::account(&event.account_id),
        ]);

        Ok(receipt)
    }

    /// Records a stock adjustment. Stock only: no transaction row, and
    /// the weighted-average cost stays where it was.
    pub async fn record_adjustment(
        &self,
        event: AdjustmentEvent,
    ) -> LedgerResult<AdjustmentReceipt> {
        event.validate().map_err(CoreError::from)?;
        debug!(product_id = %event.product_id, quantity = %event.quantity, "Adjustment validated");

        let _guards = self
            .locks
            .acquire_many(vec![LockKey::product(&event.product_id)])
            .await;

        let receipt = self
            .retry_loop("adjustment", |attempt| {
                debug!(product_id = %event.product_id, attempt, "Applying adjustment");
                self.try_adjustment(&event)
            })
            .await?;

        info!(
            movement_id = %receipt.movement_id,
            product_id = %event.product_id,
            quantity = %event.quantity,
            new_stock = %receipt.new_stock,
            reason = %event.reason,
            "Adjustment recorded"
        );

        self.hub.publish(EntityChanged::product(&event.product_id));

        Ok(receipt)
    }

    /// Records an expense drawn from an account.
    pub async fn record_expense(&self, event: ExpenseEvent) -> LedgerResult<ExpenseReceipt> {
        event.validate().map_err(CoreError::from)?;
        debug!(account_id = %event.account_id, amount = %event.amount, "Expense validated");

        let _guards = self
            .locks
            .acquire_many(vec![LockKey::account(&event.account_id)])
            .await;

        let receipt = self
            .retry_loop("expense", |attempt| {
                debug!(account_id = %event.account_id, attempt, "Applying expense");
                self.try_expense(&event)
            })
            .await?;

        info!(
            transaction_id = %receipt.transaction_id,
            account_id = %event.account_id,
            amount = %event.amount,
            category = %event.category,
            "Expense recorded"
        );

        self.hub.publish(EntityChanged::account(&event.account_id));

        Ok(receipt)
    }

    /// Records a transfer from an account to another account or to a
    /// supplier (paying down the payable balance). Exactly one
    /// transaction row referencing both balances.
    pub async fn record_transfer(&self, event: TransferEvent) -> LedgerResult<TransferReceipt> {
        event.validate().map_err(CoreError::from)?;
        debug!(from = %event.from_account_id, amount = %event.amount, "Transfer validated");

        let destination_key = match &event.destination {
            TransferDestination::Account(id) => LockKey::account(id),
            TransferDestination::Supplier(id) => LockKey::supplier(id),
        };
        let _guards = self
            .locks
            .acquire_many(vec![
                LockKey::account(&event.from_account_id),
                destination_key,
            ])
            .await;

        let receipt = self
            .retry_loop("transfer", |attempt| {
                debug!(from = %event.from_account_id, attempt, "Applying transfer");
                self.try_transfer(&event)
            })
            .await?;

        info!(
            transaction_id = %receipt.transaction_id,
            from = %event.from_account_id,
            amount = %event.amount,
            "Transfer recorded"
        );

        let destination_event = match &event.destination {
            TransferDestination::Account(id) => EntityChanged::account(id),
            TransferDestination::Supplier(id) => EntityChanged::supplier(id),
        };
        self.hub.publish_all([
            EntityChanged::account(&event.from_account_id),
            destination_event,
        ]);

        Ok(receipt)
    }

    // =========================================================================
    // Write Attempts (one sqlite transaction each)
    // =========================================================================

    async fn try_purchase(&self, event: &PurchaseEvent) -> LedgerResult<Attempt<PurchaseReceipt>> {
        let now = Utc::now();
        let product = self.load_product(&event.product_id).await?;
        let supplier = self.load_supplier(&event.supplier_id).await?;

        let costed = costing::apply_purchase(
            product.current_stock,
            product.weighted_avg_cost,
            event.quantity,
            event.unit_price,
        )?;

        if product.exceeds_capacity(event.quantity) {
            // Deliveries are recorded as metered even when the dip reading
            // disagrees with nameplate capacity; flag it for the operator
            warn!(
                product_id = %product.id,
                stock = %product.current_stock,
                quantity = %event.quantity,
                capacity = ?product.tank_capacity,
                "Purchase exceeds tank capacity"
            );
        }

        let paid = event.paid_amount;
        let account = if paid.is_positive() {
            // validate() guarantees account_id is present here
            let account_id = event.account_id.as_deref().unwrap_or_default();
            let account = self.load_account(account_id).await?;
            self.check_debit(&account, paid)?;
            Some(account)
        } else {
            None
        };

        let total = event.total_amount();
        let due = event.due_amount();
        let reference = EventRef::new(RefKind::PurchaseOrder, event.reference.clone());

        let mut tx = self.db.begin().await?;

        if !self
            .db
            .products()
            .cas_update_costing(
                &mut tx,
                &product.id,
                product.version,
                costed.new_stock,
                costed.new_avg_cost,
                costed.new_stock_value,
                now,
            )
            .await?
        {
            return Ok(Attempt::Conflict {
                entity: "Product",
                id: product.id,
            });
        }

        let movement = StockMovement {
            id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            movement_type: MovementType::Purchase,
            quantity: event.quantity,
            unit_price: event.unit_price,
            avg_cost_after: costed.new_avg_cost,
            balance_after: costed.new_stock,
            reference: Some(reference.clone()),
            note: None,
            created_at: now,
        };
        self.db
            .movements()
            .append(&mut tx, &movement)
            .await
            .map_err(|e| reference_conflict(e, &reference))?;

        let order = PurchaseOrder {
            id: event.reference.clone(),
            supplier_id: supplier.id.clone(),
            invoice_number: event.invoice_number.clone(),
            total_amount: total,
            paid_amount: paid,
            due_amount: due,
            payment_method: event.payment_method,
            created_at: now,
        };
        let line = PurchaseLine {
            id: Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            product_id: product.id.clone(),
            quantity: event.quantity,
            unit_price: event.unit_price,
            line_total: total,
        };
        self.db
            .purchase_orders()
            .insert(&mut tx, &order, std::slice::from_ref(&line))
            .await
            .map_err(|e| reference_conflict(e, &reference))?;

        let mut transaction_id = None;
        if let Some(account) = &account {
            if !self
                .db
                .accounts()
                .cas_update_balance(
                    &mut tx,
                    &account.id,
                    account.version,
                    account.current_balance - paid,
                    now,
                )
                .await?
            {
                return Ok(Attempt::Conflict {
                    entity: "Account",
                    id: account.id.clone(),
                });
            }

            let payment = LedgerTransaction {
                id: Uuid::new_v4().to_string(),
                transaction_type: TransactionType::PurchasePayment,
                amount: paid,
                from_account_id: Some(account.id.clone()),
                to_account_id: None,
                supplier_id: Some(supplier.id.clone()),
                reference: Some(reference.clone()),
                description: Some(format!("Invoice {}", event.invoice_number)),
                created_at: now,
            };
            self.db
                .transactions()
                .append(&mut tx, &payment)
                .await
                .map_err(|e| reference_conflict(e, &reference))?;
            transaction_id = Some(payment.id);
        }

        if due.is_positive()
            && !self
                .db
                .suppliers()
                .cas_update_balance(
                    &mut tx,
                    &supplier.id,
                    supplier.version,
                    supplier.account_balance + due,
                    now,
                )
                .await?
        {
            return Ok(Attempt::Conflict {
                entity: "Supplier",
                id: supplier.id,
            });
        }

        tx.commit().await.map_err(DbError::from)?;

        Ok(Attempt::Applied(PurchaseReceipt {
            order_id: order.id,
            movement_id: movement.id,
            transaction_id,
            new_stock: costed.new_stock,
            new_avg_cost: costed.new_avg_cost,
        }))
    }

    async fn try_sale(&self, event: &SaleEvent) -> LedgerResult<Attempt<SaleReceipt>> {
        let now = Utc::now();
        let product = self.load_product(&event.product_id).await?;
        let account = self.load_account(&event.account_id).await?;

        let costed = costing::apply_sale(
            product.current_stock,
            product.weighted_avg_cost,
            event.quantity,
        )?;

        // The sale record snapshots money at the paisa; the product's own
        // average stays at full precision
        let sale_amount = event.sale_amount().rounded();
        let cogs_per_unit = costed.cogs_per_unit.rounded();
        let gross_profit = (sale_amount - cogs_per_unit * event.quantity).rounded();
        let reference = EventRef::new(RefKind::Sale, event.reference.clone());

        let mut tx = self.db.begin().await?;

        if !self
            .db
            .products()
            .cas_update_costing(
                &mut tx,
                &product.id,
                product.version,
                costed.new_stock,
                product.weighted_avg_cost,
                costed.new_stock_value,
                now,
            )
            .await?
        {
            return Ok(Attempt::Conflict {
                entity: "Product",
                id: product.id,
            });
        }

        let movement = StockMovement {
            id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            movement_type: MovementType::Sale,
            quantity: -event.quantity,
            unit_price: event.selling_price,
            avg_cost_after: product.weighted_avg_cost,
            balance_after: costed.new_stock,
            reference: Some(reference.clone()),
            note: None,
            created_at: now,
        };
        self.db
            .movements()
            .append(&mut tx, &movement)
            .await
            .map_err(|e| reference_conflict(e, &reference))?;

        if !self
            .db
            .accounts()
            .cas_update_balance(
                &mut tx,
                &account.id,
                account.version,
                account.current_balance + sale_amount,
                now,
            )
            .await?
        {
            return Ok(Attempt::Conflict {
                entity: "Account",
                id: account.id,
            });
        }

        let receipt_row = LedgerTransaction {
            id: Uuid::new_v4().to_string(),
            transaction_type: TransactionType::SaleReceipt,
            amount: sale_amount,
            from_account_id: None,
            to_account_id: Some(account.id.clone()),
            supplier_id: None,
            reference: Some(reference.clone()),
            description: event.nozzle_id.as_ref().map(|n| format!("Nozzle {n}")),
            created_at: now,
        };
        self.db
            .transactions()
            .append(&mut tx, &receipt_row)
            .await
            .map_err(|e| reference_conflict(e, &reference))?;

        let sale = SaleRecord {
            id: event.reference.clone(),
            product_id: product.id.clone(),
            nozzle_id: event.nozzle_id.clone(),
            quantity: event.quantity,
            selling_price: event.selling_price,
            sale_amount,
            cogs_per_unit,
            gross_profit,
            payment_method: event.payment_method,
            account_id: account.id.clone(),
            created_at: now,
        };
        self.db
            .sales()
            .insert(&mut tx, &sale)
            .await
            .map_err(|e| reference_conflict(e, &reference))?;

        tx.commit().await.map_err(DbError::from)?;

        Ok(Attempt::Applied(SaleReceipt {
            sale_id: sale.id,
            movement_id: movement.id,
            transaction_id: receipt_row.id,
            new_stock: costed.new_stock,
            cogs_per_unit,
            gross_profit,
        }))
    }

    async fn try_adjustment(
        &self,
        event: &AdjustmentEvent,
    ) -> LedgerResult<Attempt<AdjustmentReceipt>> {
        let now = Utc::now();
        let product = self.load_product(&event.product_id).await?;

        let new_stock = costing::apply_adjustment(product.current_stock, event.quantity)?;
        // Quantity moved, cost basis untouched: value follows quantity
        let new_stock_value = costing::stock_value(new_stock, product.weighted_avg_cost);
        let reference = event
            .reference
            .as_ref()
            .map(|r| EventRef::new(RefKind::Adjustment, r.clone()));

        let mut tx = self.db.begin().await?;

        if !self
            .db
            .products()
            .cas_update_costing(
                &mut tx,
                &product.id,
                product.version,
                new_stock,
                product.weighted_avg_cost,
                new_stock_value,
                now,
            )
            .await?
        {
            return Ok(Attempt::Conflict {
                entity: "Product",
                id: product.id,
            });
        }

        let movement = StockMovement {
            id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            movement_type: MovementType::Adjustment,
            quantity: event.quantity,
            unit_price: Money::zero(),
            avg_cost_after: product.weighted_avg_cost,
            balance_after: new_stock,
            reference: reference.clone(),
            note: Some(event.reason.clone()),
            created_at: now,
        };
        self.db
            .movements()
            .append(&mut tx, &movement)
            .await
            .map_err(|e| match &reference {
                Some(r) => reference_conflict(e, r),
                None => LedgerError::from(e),
            })?;

        tx.commit().await.map_err(DbError::from)?;

        Ok(Attempt::Applied(AdjustmentReceipt {
            movement_id: movement.id,
            new_stock,
        }))
    }

    async fn try_expense(&self, event: &ExpenseEvent) -> LedgerResult<Attempt<ExpenseReceipt>> {
        let now = Utc::now();
        let account = self.load_account(&event.account_id).await?;
        self.check_debit(&account, event.amount)?;

        let new_balance = account.current_balance - event.amount;
        let reference = event
            .reference
            .as_ref()
            .map(|r| EventRef::new(RefKind::Expense, r.clone()));

        let mut tx = self.db.begin().await?;

        if !self
            .db
            .accounts()
            .cas_update_balance(&mut tx, &account.id, account.version, new_balance, now)
            .await?
        {
            return Ok(Attempt::Conflict {
                entity: "Account",
                id: account.id,
            });
        }

        let expense_row = LedgerTransaction {
            id: Uuid::new_v4().to_string(),
            transaction_type: TransactionType::Expense,
            amount: event.amount,
            from_account_id: Some(account.id.clone()),
            to_account_id: None,
            supplier_id: None,
            reference: reference.clone(),
            description: Some(event.category.clone()),
            created_at: now,
        };
        self.db
            .transactions()
            .append(&mut tx, &expense_row)
            .await
            .map_err(|e| match &reference {
                Some(r) => reference_conflict(e, r),
                None => LedgerError::from(e),
            })?;

        tx.commit().await.map_err(DbError::from)?;

        Ok(Attempt::Applied(ExpenseReceipt {
            transaction_id: expense_row.id,
            new_balance,
        }))
    }

    async fn try_transfer(&self, event: &TransferEvent) -> LedgerResult<Attempt<TransferReceipt>> {
        let now = Utc::now();
        let from = self.load_account(&event.from_account_id).await?;
        self.check_debit(&from, event.amount)?;

        let reference = event
            .reference
            .as_ref()
            .map(|r| EventRef::new(RefKind::Transfer, r.clone()));

        enum Destination {
            Account(Account),
            Supplier(Supplier),
        }
        let destination = match &event.destination {
            TransferDestination::Account(id) => Destination::Account(self.load_account(id).await?),
            TransferDestination::Supplier(id) => {
                Destination::Supplier(self.load_supplier(id).await?)
            }
        };

        let mut tx = self.db.begin().await?;

        if !self
            .db
            .accounts()
            .cas_update_balance(
                &mut tx,
                &from.id,
                from.version,
                from.current_balance - event.amount,
                now,
            )
            .await?
        {
            return Ok(Attempt::Conflict {
                entity: "Account",
                id: from.id,
            });
        }

        let (to_account_id, supplier_id, destination_balance) = match &destination {
            Destination::Account(account) => {
                let new_balance = account.current_balance + event.amount;
                if !self
                    .db
                    .accounts()
                    .cas_update_balance(&mut tx, &account.id, account.version, new_balance, now)
                    .await?
                {
                    return Ok(Attempt::Conflict {
                        entity: "Account",
                        id: account.id.clone(),
                    });
                }
                (Some(account.id.clone()), None, new_balance)
            }
            Destination::Supplier(supplier) => {
                // Paying the supplier reduces what the business owes them
                let new_balance = supplier.account_balance - event.amount;
                if !self
                    .db
                    .suppliers()
                    .cas_update_balance(&mut tx, &supplier.id, supplier.version, new_balance, now)
                    .await?
                {
                    return Ok(Attempt::Conflict {
                        entity: "Supplier",
                        id: supplier.id.clone(),
                    });
                }
                (None, Some(supplier.id.clone()), new_balance)
            }
        };

        let transfer_row = LedgerTransaction {
            id: Uuid::new_v4().to_string(),
            transaction_type: TransactionType::Transfer,
            amount: event.amount,
            from_account_id: Some(from.id.clone()),
            to_account_id,
            supplier_id,
            reference: reference.clone(),
            description: None,
            created_at: now,
        };
        self.db
            .transactions()
            .append(&mut tx, &transfer_row)
            .await
            .map_err(|e| match &reference {
                Some(r) => reference_conflict(e, r),
                None => LedgerError::from(e),
            })?;

        tx.commit().await.map_err(DbError::from)?;

        Ok(Attempt::Applied(TransferReceipt {
            transaction_id: transfer_row.id,
            from_balance: from.current_balance - event.amount,
            destination_balance,
        }))
    }

    // =========================================================================
    // Shared Helpers
    // =========================================================================

    /// Runs one write attempt under the bounded CAS retry policy.
    ///
    /// The entity locks are already held; a conflict here means an
    /// out-of-band writer touched a row between our read and our CAS.
    async fn retry_loop<T, F, Fut>(&self, operation: &'static str, mut f: F) -> LedgerResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: std::future::Future<Output = LedgerResult<Attempt<T>>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match f(attempt).await? {
                Attempt::Applied(value) => return Ok(value),
                Attempt::Conflict { entity, id } => {
                    if attempt >= self.config.cas_max_retries {
                        warn!(operation, entity, id = %id, attempt, "CAS retries exhausted");
                        return Err(CoreError::ConcurrentModification {
                            entity: entity.to_string(),
                            id,
                        }
                        .into());
                    }
                    warn!(operation, entity, id = %id, attempt, "CAS conflict, retrying");
                }
            }
        }
    }

    async fn load_product(&self, id: &str) -> LedgerResult<Product> {
        let product = self
            .db
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;
        if !product.is_active {
            return Err(CoreError::ProductNotFound(id.to_string()).into());
        }
        Ok(product)
    }

    async fn load_account(&self, id: &str) -> LedgerResult<Account> {
        let account = self
            .db
            .accounts()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::AccountNotFound(id.to_string()))?;
        if !account.is_active() {
            return Err(CoreError::AccountInactive(id.to_string()).into());
        }
        Ok(account)
    }

    async fn load_supplier(&self, id: &str) -> LedgerResult<Supplier> {
        let supplier = self
            .db
            .suppliers()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::SupplierNotFound(id.to_string()))?;
        if !supplier.is_active {
            return Err(CoreError::SupplierNotFound(id.to_string()).into());
        }
        Ok(supplier)
    }

    fn check_debit(&self, account: &Account, amount: Money) -> LedgerResult<()> {
        if !account.can_debit(amount, self.config.allow_negative_balance) {
            return Err(CoreError::InsufficientFunds {
                account_id: account.id.clone(),
                balance: account.current_balance,
                requested: amount,
            }
            .into());
        }
        Ok(())
    }
}

/// Maps a unique-constraint violation on a log append to the domain's
/// duplicate-reference rejection; anything else passes through.
fn reference_conflict(err: DbError, reference: &EventRef) -> LedgerError {
    if err.is_unique_violation() {
        LedgerError::Core(CoreError::DuplicateReference {
            kind: reference.kind.as_str().to_string(),
            id: reference.id.clone(),
        })
    } else {
        LedgerError::Db(err)
    }
}
