//! # Purchase Order Repository
//!
//! Database operations for purchase orders and their line items.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{get_decimal, get_money};
use forecourt_core::types::{PaymentMethod, PurchaseLine, PurchaseOrder};

/// Repository for purchase order database operations.
#[derive(Debug, Clone)]
pub struct PurchaseOrderRepository {
    pool: SqlitePool,
}

fn row_to_order(row: &SqliteRow) -> DbResult<PurchaseOrder> {
    use sqlx::Row;

    let payment_method: String = row.try_get("payment_method")?;

    Ok(PurchaseOrder {
        id: row.try_get("id")?,
        supplier_id: row.try_get("supplier_id")?,
        invoice_number: row.try_get("invoice_number")?,
        total_amount: get_money(row, "total_amount")?,
        paid_amount: get_money(row, "paid_amount")?,
        due_amount: get_money(row, "due_amount")?,
        payment_method: PaymentMethod::parse(&payment_method).ok_or_else(|| {
            DbError::decode("payment_method", format!("unknown: '{payment_method}'"))
        })?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_line(row: &SqliteRow) -> DbResult<PurchaseLine> {
    use sqlx::Row;

    Ok(PurchaseLine {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        product_id: row.try_get("product_id")?,
        quantity: get_decimal(row, "quantity")?,
        unit_price: get_money(row, "unit_price")?,
        line_total: get_money(row, "line_total")?,
    })
}

impl PurchaseOrderRepository {
    /// Creates a new PurchaseOrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseOrderRepository { pool }
    }

    /// Inserts an order and its line items in the caller's transaction.
    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        order: &PurchaseOrder,
        lines: &[PurchaseLine],
    ) -> DbResult<()> {
        debug!(
            id = %order.id,
            supplier_id = %order.supplier_id,
            invoice = %order.invoice_number,
            total = %order.total_amount,
            "Inserting purchase order"
        );

        sqlx::query(
            r#"
            INSERT INTO purchase_orders (
                id, supplier_id, invoice_number,
                total_amount, paid_amount, due_amount,
                payment_method, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&order.id)
        .bind(&order.supplier_id)
        .bind(&order.invoice_number)
        .bind(order.total_amount.amount().to_string())
        .bind(order.paid_amount.amount().to_string())
        .bind(order.due_amount.amount().to_string())
        .bind(order.payment_method.as_str())
        .bind(order.created_at)
        .execute(&mut *conn)
        .await?;

        for line in lines {
            sqlx::query(
                r#"
                INSERT INTO purchase_order_items (
                    id, order_id, product_id, quantity, unit_price, line_total
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&line.id)
            .bind(&line.order_id)
            .bind(&line.product_id)
            .bind(line.quantity.to_string())
            .bind(line.unit_price.amount().to_string())
            .bind(line.line_total.amount().to_string())
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Gets an order with its line items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<(PurchaseOrder, Vec<PurchaseLine>)>> {
        let row = sqlx::query("SELECT * FROM purchase_orders WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let order = row_to_order(&row)?;

        let line_rows = sqlx::query(
            "SELECT * FROM purchase_order_items WHERE order_id = ?1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        let lines = line_rows.iter().map(row_to_line).collect::<DbResult<_>>()?;

        Ok(Some((order, lines)))
    }

    /// Lists orders in a `[from, to]` window, oldest first, optionally
    /// filtered by supplier.
    pub async fn list_in_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        supplier_id: Option<&str>,
    ) -> DbResult<Vec<PurchaseOrder>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM purchase_orders
            WHERE created_at >= ?1 AND created_at <= ?2
              AND (?3 IS NULL OR supplier_id = ?3)
            ORDER BY created_at, id
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(supplier_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_order).collect()
    }
}
