//! Row-mapping trait for the SQLite store.

use rusqlite::Row;

/// A trait for types that can be built from a database row.
///
/// Implementations read columns by name so statements stay free to select
/// columns in any order.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}
