//! # Supplier Repository
//!
//! Database operations for suppliers and their payable balances.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::get_money;
use forecourt_core::types::Supplier;
use forecourt_core::Money;

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

fn row_to_supplier(row: &SqliteRow) -> DbResult<Supplier> {
    use sqlx::Row;

    Ok(Supplier {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        account_balance: get_money(row, "account_balance")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        version: row.try_get("version")?,
    })
}

impl SupplierRepository {
    /// Creates a new SupplierRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Gets a supplier by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        let row = sqlx::query("SELECT * FROM suppliers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_supplier).transpose()
    }

    /// Lists active suppliers sorted by name.
    pub async fn list_active(&self) -> DbResult<Vec<Supplier>> {
        let rows = sqlx::query("SELECT * FROM suppliers WHERE is_active = 1 ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_supplier).collect()
    }

    /// Inserts a new supplier.
    pub async fn insert(&self, conn: &mut SqliteConnection, supplier: &Supplier) -> DbResult<()> {
        debug!(id = %supplier.id, name = %supplier.name, "Inserting supplier");

        sqlx::query(
            r#"
            INSERT INTO suppliers (
                id, name, account_balance, is_active, created_at, updated_at, version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(supplier.account_balance.amount().to_string())
        .bind(supplier.is_active)
        .bind(supplier.created_at)
        .bind(supplier.updated_at)
        .bind(supplier.version)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Compare-and-swap payable balance update.
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
        debug!(id = %id, expected_version, balance = %new_balance, "CAS supplier balance");

        let result = sqlx::query(
            r#"
            UPDATE suppliers SET
                account_balance = ?3,
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

    /// Deactivates a supplier. History keeps referencing them.
    pub async fn deactivate(&self, conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE suppliers SET
                is_active = 0,
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
            return Err(DbError::not_found("Supplier", id));
        }

        Ok(())
    }
}
