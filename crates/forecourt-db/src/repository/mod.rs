//! # Repository Implementations
//!
//! One repository per entity. Read paths borrow pool connections; every
//! mutating method takes an open transaction so the caller controls the
//! unit of work.
//!
//! ## Decimal Columns
//! Quantities and monetary amounts are stored as canonical decimal TEXT
//! and re-parsed through `rust_decimal` on the way out. SQLite's REAL
//! would silently round them; TEXT round-trips exactly.

pub mod account;
pub mod movement;
pub mod product;
pub mod purchase;
pub mod sale;
pub mod supplier;
pub mod transaction;

use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use forecourt_core::types::{EventRef, RefKind};
use forecourt_core::Money;

/// Generates a new entity id.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Reads a decimal TEXT column.
pub(crate) fn get_decimal(row: &SqliteRow, column: &str) -> DbResult<Decimal> {
    let raw: String = row.try_get(column)?;
    raw.parse()
        .map_err(|e| DbError::decode(column, format!("{e}: '{raw}'")))
}

/// Reads a nullable decimal TEXT column.
pub(crate) fn get_opt_decimal(row: &SqliteRow, column: &str) -> DbResult<Option<Decimal>> {
    let raw: Option<String> = row.try_get(column)?;
    match raw {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| DbError::decode(column, format!("{e}: '{raw}'"))),
        None => Ok(None),
    }
}

/// Reads a monetary TEXT column.
pub(crate) fn get_money(row: &SqliteRow, column: &str) -> DbResult<Money> {
    get_decimal(row, column).map(Money::new)
}

/// Reads the (reference_type, reference_id) column pair.
pub(crate) fn get_reference(row: &SqliteRow) -> DbResult<Option<EventRef>> {
    let kind: Option<String> = row.try_get("reference_type")?;
    let id: Option<String> = row.try_get("reference_id")?;
    match (kind, id) {
        (Some(kind), Some(id)) => {
            let kind = RefKind::parse(&kind)
                .ok_or_else(|| DbError::decode("reference_type", format!("unknown: '{kind}'")))?;
            Ok(Some(EventRef { kind, id }))
        }
        (None, None) => Ok(None),
        // One half set without the other is corruption, not a variant
        _ => Err(DbError::decode(
            "reference_type",
            "reference pair half-populated",
        )),
    }
}

/// Splits an optional reference into bindable column values.
pub(crate) fn reference_columns(reference: &Option<EventRef>) -> (Option<&'static str>, Option<&str>) {
    match reference {
        Some(r) => (Some(r.kind.as_str()), Some(r.id.as_str())),
        None => (None, None),
    }
}
