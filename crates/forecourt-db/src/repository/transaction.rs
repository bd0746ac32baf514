//! # Transaction Log Repository
//!
//! Append-only log of money movements. Same discipline as the stock
//! movement log: INSERT and SELECT only, with the unique reference pair
//! acting as the idempotency guard.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{get_money, get_reference, reference_columns};
use forecourt_core::types::{LedgerTransaction, TransactionType};

/// Repository for the money transaction log.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

fn row_to_transaction(row: &SqliteRow) -> DbResult<LedgerTransaction> {
    use sqlx::Row;

    let transaction_type: String = row.try_get("transaction_type")?;

    Ok(LedgerTransaction {
        id: row.try_get("id")?,
        transaction_type: TransactionType::parse(&transaction_type).ok_or_else(|| {
            DbError::decode(
                "transaction_type",
                format!("unknown: '{transaction_type}'"),
            )
        })?,
        amount: get_money(row, "amount")?,
        from_account_id: row.try_get("from_account_id")?,
        to_account_id: row.try_get("to_account_id")?,
        supplier_id: row.try_get("supplier_id")?,
        reference: get_reference(row)?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Appends one transaction row.
    ///
    /// Runs inside the same transaction as the balance update(s) it
    /// describes. A `UniqueViolation` here means the originating event was
    /// already recorded.
    pub async fn append(
        &self,
        conn: &mut SqliteConnection,
        tx: &LedgerTransaction,
    ) -> DbResult<()> {
        debug!(
            id = %tx.id,
            transaction_type = %tx.transaction_type.as_str(),
            amount = %tx.amount,
            "Appending transaction"
        );

        let (reference_type, reference_id) = reference_columns(&tx.reference);

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, transaction_type, amount,
                from_account_id, to_account_id, supplier_id,
                reference_type, reference_id, description, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&tx.id)
        .bind(tx.transaction_type.as_str())
        .bind(tx.amount.amount().to_string())
        .bind(&tx.from_account_id)
        .bind(&tx.to_account_id)
        .bind(&tx.supplier_id)
        .bind(reference_type)
        .bind(reference_id)
        .bind(&tx.description)
        .bind(tx.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Lists transactions in a `[from, to]` window, oldest first.
    pub async fn list_in_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<LedgerTransaction>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM transactions
            WHERE created_at >= ?1 AND created_at <= ?2
            ORDER BY created_at, id
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_transaction).collect()
    }

    /// Lists transactions touching an account in a window, oldest first.
    pub async fn list_for_account_in_window(
        &self,
        account_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<LedgerTransaction>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM transactions
            WHERE (from_account_id = ?1 OR to_account_id = ?1)
              AND created_at >= ?2 AND created_at <= ?3
            ORDER BY created_at, id
            "#,
        )
        .bind(account_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_transaction).collect()
    }

    /// Lists every transaction touching an account, oldest first. Used by
    /// full-history reconciliation.
    pub async fn list_for_account(&self, account_id: &str) -> DbResult<Vec<LedgerTransaction>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM transactions
            WHERE from_account_id = ?1 OR to_account_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_transaction).collect()
    }

    /// Lists transactions recorded against a supplier in a window.
    pub async fn list_for_supplier_in_window(
        &self,
        supplier_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<LedgerTransaction>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM transactions
            WHERE supplier_id = ?1
              AND created_at >= ?2 AND created_at <= ?3
            ORDER BY created_at, id
            "#,
        )
        .bind(supplier_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_transaction).collect()
    }
}
