//! # Product Repository
//!
//! Database operations for products and their cached costing fields.
//!
//! ## The Costing Trio
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  current_stock, weighted_avg_cost and stock_value are one value in     │
//! │  three columns. They are ONLY written together, through                │
//! │  cas_update_costing, inside the same transaction that appends the     │
//! │  stock movement they summarize. Writing one without the others would   │
//! │  desynchronize the materialized view from its log.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{get_decimal, get_money, get_opt_decimal};
use forecourt_core::types::{Product, ProductType};
use forecourt_core::Money;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

fn row_to_product(row: &SqliteRow) -> DbResult<Product> {
    use sqlx::Row;

    let product_type: String = row.try_get("product_type")?;

    Ok(Product {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        product_type: ProductType::parse(&product_type)
            .ok_or_else(|| DbError::decode("product_type", format!("unknown: '{product_type}'")))?,
        unit: row.try_get("unit")?,
        current_stock: get_decimal(row, "current_stock")?,
        weighted_avg_cost: get_money(row, "weighted_avg_cost")?,
        minimum_stock_level: get_decimal(row, "minimum_stock_level")?,
        tank_capacity: get_opt_decimal(row, "tank_capacity")?,
        selling_price: get_money(row, "selling_price")?,
        stock_value: get_money(row, "stock_value")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        version: row.try_get("version")?,
    })
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row = sqlx::query("SELECT * FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_product).transpose()
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let rows = sqlx::query("SELECT * FROM products WHERE is_active = 1 ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_product).collect()
    }

    /// Lists active products at or below their minimum stock level.
    pub async fn list_below_minimum(&self) -> DbResult<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM products
            WHERE is_active = 1
              AND CAST(current_stock AS REAL) <= CAST(minimum_stock_level AS REAL)
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_product).collect()
    }

    /// Inserts a new product (catalog management / seeding).
    pub async fn insert(&self, conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, product_type, unit,
                current_stock, weighted_avg_cost, minimum_stock_level,
                tank_capacity, selling_price, stock_value,
                is_active, created_at, updated_at, version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.product_type.as_str())
        .bind(&product.unit)
        .bind(product.current_stock.to_string())
        .bind(product.weighted_avg_cost.amount().to_string())
        .bind(product.minimum_stock_level.to_string())
        .bind(product.tank_capacity.map(|c| c.to_string()))
        .bind(product.selling_price.amount().to_string())
        .bind(product.stock_value.amount().to_string())
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .bind(product.version)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Compare-and-swap update of the costing trio.
    ///
    /// ## Returns
    /// * `Ok(true)` - costing written, version bumped
    /// * `Ok(false)` - version conflict; caller re-reads and retries
    pub async fn cas_update_costing(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        expected_version: i64,
        new_stock: Decimal,
        new_avg_cost: Money,
        new_stock_value: Money,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(
            id = %id,
            expected_version,
            stock = %new_stock,
            avg_cost = %new_avg_cost,
            "CAS product costing"
        );

        let result = sqlx::query(
            r#"
            UPDATE products SET
                current_stock = ?3,
                weighted_avg_cost = ?4,
                stock_value = ?5,
                updated_at = ?6,
                version = version + 1
            WHERE id = ?1 AND version = ?2
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(new_stock.to_string())
        .bind(new_avg_cost.amount().to_string())
        .bind(new_stock_value.amount().to_string())
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// ## Why Soft Delete?
    /// Historical movements and sales still reference this product.
    pub async fn soft_delete(&self, conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
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
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for setup checks).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
