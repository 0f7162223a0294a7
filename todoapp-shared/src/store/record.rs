//! Row shapes the record store operates on
//!
//! - [`Fields`]: anything that can hand over `(column, value)` pairs; full
//!   records and partial "submodel" patches both implement it.
//! - [`Projection`]: a shape that can be decoded from a row, with the columns
//!   to select.
//! - [`Record`]: a table-backed row: projection of itself, plus table name,
//!   primary key and DDL.
//!
//! Every table also has a `deleted_at` column managed by the store; it is not
//! part of any record's column list.

use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;

use super::filter::Value;

/// Column/value pairs written by create and update operations
pub trait Fields {
    fn fields(&self) -> Vec<(&'static str, Value)>;
}

/// A decodable row shape
pub trait Projection: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    /// Columns selected when reading this shape
    const COLUMNS: &'static [&'static str];
}

/// A table-backed row
pub trait Record: Projection + Fields {
    /// Table name
    const TABLE: &'static str;

    /// Primary key column; never written by updates
    const KEY: &'static str = "id";

    /// Statements creating the table and its indexes (idempotent)
    const SCHEMA: &'static [&'static str];
}

/// Column name of the soft-delete marker
pub const DELETED_AT: &str = "deleted_at";
