//! # Sale Repository
//!
//! Database operations for sale records (fuel nozzle readings and counter
//! sales).
//!
//! ## Snapshot Pattern
//! `cogs_per_unit` freezes the product's weighted-average cost at sale
//! time. Later purchases move the average for future sales only; rows
//! here are never recomputed.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{get_decimal, get_money};
use forecourt_core::types::{PaymentMethod, SaleRecord};

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

fn row_to_sale(row: &SqliteRow) -> DbResult<SaleRecord> {
    use sqlx::Row;

    let payment_method: String = row.try_get("payment_method")?;

    Ok(SaleRecord {
        id: row.try_get("id")?,
        product_id: row.try_get("product_id")?,
        nozzle_id: row.try_get("nozzle_id")?,
        quantity: get_decimal(row, "quantity")?,
        selling_price: get_money(row, "selling_price")?,
        sale_amount: get_money(row, "sale_amount")?,
        cogs_per_unit: get_money(row, "cogs_per_unit")?,
        gross_profit: get_money(row, "gross_profit")?,
        payment_method: PaymentMethod::parse(&payment_method).ok_or_else(|| {
            DbError::decode("payment_method", format!("unknown: '{payment_method}'"))
        })?,
        account_id: row.try_get("account_id")?,
        created_at: row.try_get("created_at")?,
    })
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Inserts a sale record in the caller's transaction.
    pub async fn insert(&self, conn: &mut SqliteConnection, sale: &SaleRecord) -> DbResult<()> {
        debug!(
            id = %sale.id,
            product_id = %sale.product_id,
            quantity = %sale.quantity,
            amount = %sale.sale_amount,
            "Inserting sale"
        );

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, product_id, nozzle_id,
                quantity, selling_price, sale_amount,
                cogs_per_unit, gross_profit,
                payment_method, account_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.product_id)
        .bind(&sale.nozzle_id)
        .bind(sale.quantity.to_string())
        .bind(sale.selling_price.amount().to_string())
        .bind(sale.sale_amount.amount().to_string())
        .bind(sale.cogs_per_unit.amount().to_string())
        .bind(sale.gross_profit.amount().to_string())
        .bind(sale.payment_method.as_str())
        .bind(&sale.account_id)
        .bind(sale.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Gets a sale by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SaleRecord>> {
        let row = sqlx::query("SELECT * FROM sales WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_sale).transpose()
    }

    /// Lists sales in a `[from, to]` window, oldest first, optionally
    /// filtered by product and payment method.
    pub async fn list_in_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        product_id: Option<&str>,
        payment_method: Option<PaymentMethod>,
    ) -> DbResult<Vec<SaleRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM sales
            WHERE created_at >= ?1 AND created_at <= ?2
              AND (?3 IS NULL OR product_id = ?3)
              AND (?4 IS NULL OR payment_method = ?4)
            ORDER BY created_at, id
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(product_id)
        .bind(payment_method.map(|m| m.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_sale).collect()
    }
}
