//! # Account Repository
//!
//! Database operations for cash/bank accounts.
//!
//! ## Balance Update Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Versioned Compare-And-Swap                              │
//! │                                                                         │
//! │  ❌ WRONG: blind write (lost updates under concurrency)                │
//! │     UPDATE accounts SET current_balance = ? WHERE id = ?               │
//! │                                                                         │
//! │  ✅ CORRECT: CAS against the version the caller read                   │
//! │     UPDATE accounts                                                    │
//! │     SET current_balance = ?, version = version + 1, updated_at = ?     │
//! │     WHERE id = ? AND version = ?                                       │
//! │                                                                         │
//! │  rows_affected == 0 → someone won the race; the coordinator re-reads  │
//! │  and retries a bounded number of times.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::get_money;
use forecourt_core::types::{Account, AccountStatus, AccountType};
use forecourt_core::Money;

/// Repository for account database operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

fn row_to_account(row: &SqliteRow) -> DbResult<Account> {
    use sqlx::Row;

    let account_type: String = row.try_get("account_type")?;
    let status: String = row.try_get("status")?;

    Ok(Account {
        id: row.try_get("id")?,
        account_type: AccountType::parse(&account_type)
            .ok_or_else(|| DbError::decode("account_type", format!("unknown: '{account_type}'")))?,
        name: row.try_get("name")?,
        opening_balance: get_money(row, "opening_balance")?,
        current_balance: get_money(row, "current_balance")?,
        status: AccountStatus::parse(&status)
            .ok_or_else(|| DbError::decode("status", format!("unknown: '{status}'")))?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        version: row.try_get("version")?,
    })
}

impl AccountRepository {
    /// Creates a new AccountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AccountRepository { pool }
    }

    /// Gets an account by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Account>> {
        let row = sqlx::query("SELECT * FROM accounts WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// Lists all accounts, active first, then by name.
    pub async fn list(&self) -> DbResult<Vec<Account>> {
        let rows = sqlx::query("SELECT * FROM accounts ORDER BY status, name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_account).collect()
    }

    /// Inserts a new account.
    pub async fn insert(&self, conn: &mut SqliteConnection, account: &Account) -> DbResult<()> {
        debug!(id = %account.id, name = %account.name, "Inserting account");

        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, account_type, name, opening_balance, current_balance,
                status, created_at, updated_at, version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&account.id)
        .bind(account.account_type.as_str())
        .bind(&account.name)
        .bind(account.opening_balance.amount().to_string())
        .bind(account.current_balance.amount().to_string())
        .bind(account.status.as_str())
        .bind(account.created_at)
        .bind(account.updated_at)
        .bind(account.version)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Compare-and-swap balance update.
    ///
    /// ## Returns
    /// * `Ok(true)` - balance written, version bumped
    /// * `Ok(false)` - version conflict; caller re-reads and retries
    pub async fn cas_update_balance(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        expected_version: i64,
        new_balance: Money,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(id = %id, expected_version, balance = %new_balance, "CAS account balance");

        let result = sqlx::query(
            r#"
            UPDATE accounts SET
                current_balance = ?3,
                updated_at = ?4,
                version = version + 1
            WHERE id = ?1 AND version = ?2
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(new_balance.amount().to_string())
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Deactivates an account. Accounts are never deleted; history
    /// references them.
    pub async fn deactivate(&self, conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating account");

        let result = sqlx::query(
            r#"
            UPDATE accounts SET
                status = 'inactive',
                updated_at = ?2,
                version = version + 1
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", id));
        }

        Ok(())
    }

    /// Counts accounts (for setup checks).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
