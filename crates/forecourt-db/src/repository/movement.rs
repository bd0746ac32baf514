//! # Stock Movement Log Repository
//!
//! Append-only log of stock quantity changes.
//!
//! ## Append-Only Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  This repository exposes INSERT and SELECT. There is no update and no  │
//! │  delete: the log is the source of truth the cached product fields are  │
//! │  derived from. Correcting a mistake means appending an adjustment      │
//! │  movement, never editing history.                                      │
//! │                                                                         │
//! │  The UNIQUE (reference_type, reference_id) index doubles as the        │
//! │  idempotency guard: replaying a consumed reference fails the insert.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{get_decimal, get_money, get_reference, reference_columns};
use forecourt_core::types::{MovementType, StockMovement};

/// Repository for the stock movement log.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

fn row_to_movement(row: &SqliteRow) -> DbResult<StockMovement> {
    use sqlx::Row;

    let movement_type: String = row.try_get("movement_type")?;

    Ok(StockMovement {
        id: row.try_get("id")?,
        product_id: row.try_get("product_id")?,
        movement_type: MovementType::parse(&movement_type).ok_or_else(|| {
            DbError::decode("movement_type", format!("unknown: '{movement_type}'"))
        })?,
        quantity: get_decimal(row, "quantity")?,
        unit_price: get_money(row, "unit_price")?,
        avg_cost_after: get_money(row, "avg_cost_after")?,
        balance_after: get_decimal(row, "balance_after")?,
        reference: get_reference(row)?,
        note: row.try_get("note")?,
        created_at: row.try_get("created_at")?,
    })
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Appends one movement row.
    ///
    /// Runs inside the same transaction as the product costing update it
    /// describes. A `UniqueViolation` here means the originating event was
    /// already recorded.
    pub async fn append(
        &self,
        conn: &mut SqliteConnection,
        movement: &StockMovement,
    ) -> DbResult<()> {
        debug!(
            id = %movement.id,
            product_id = %movement.product_id,
            movement_type = %movement.movement_type.as_str(),
            quantity = %movement.quantity,
            "Appending stock movement"
        );

        let (reference_type, reference_id) = reference_columns(&movement.reference);

        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, product_id, movement_type, quantity,
                unit_price, avg_cost_after, balance_after,
                reference_type, reference_id, note, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.product_id)
        .bind(movement.movement_type.as_str())
        .bind(movement.quantity.to_string())
        .bind(movement.unit_price.amount().to_string())
        .bind(movement.avg_cost_after.amount().to_string())
        .bind(movement.balance_after.to_string())
        .bind(reference_type)
        .bind(reference_id)
        .bind(&movement.note)
        .bind(movement.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Lists the most recent movements for a product, newest first.
    pub async fn list_for_product(
        &self,
        product_id: &str,
        limit: u32,
    ) -> DbResult<Vec<StockMovement>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM stock_movements
            WHERE product_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2
            "#,
        )
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_movement).collect()
    }

    /// Lists movements in a `[from, to]` window, oldest first, optionally
    /// filtered by product.
    pub async fn list_in_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        product_id: Option<&str>,
    ) -> DbResult<Vec<StockMovement>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM stock_movements
            WHERE created_at >= ?1 AND created_at <= ?2
              AND (?3 IS NULL OR product_id = ?3)
            ORDER BY created_at, id
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_movement).collect()
    }

    /// Counts movements for a product (diagnostics).
    pub async fn count_for_product(&self, product_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM stock_movements WHERE product_id = ?1")
                .bind(product_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
