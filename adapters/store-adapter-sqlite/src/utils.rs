//! Shared utilities for SQLite adapter
//!
//! Helper macros and error mapping used by the entity modules.

use backplate::prelude::*;
use sqlx::sqlite::SqliteRow;

/// Push `, field=?` for a Patch field.
/// Returns true if the field was added (for tracking has_updates)
macro_rules! push_patch {
	// For bindable values (strings, numbers, bools)
	($query:expr, $has_updates:expr, $field:literal, $patch:expr) => {{
		match $patch {
			Patch::Undefined => $has_updates,
			Patch::Null => {
				$query.push(concat!(", ", $field, "=NULL"));
				true
			}
			Patch::Value(v) => {
				$query.push(concat!(", ", $field, "=")).push_bind(v);
				true
			}
		}
	}};
}

pub(crate) use push_patch;

/// Log database error for debugging
pub(crate) fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

/// Map a single-row query result, translating SQL errors to BpResult
pub(crate) fn map_res<T, F>(row: Result<SqliteRow, sqlx::Error>, f: F) -> BpResult<T>
where
	F: FnOnce(SqliteRow) -> Result<T, sqlx::Error>,
{
	match row {
		Ok(row) => f(row).inspect_err(inspect).map_err(|_| Error::DbError),
		Err(sqlx::Error::RowNotFound) => Err(Error::NotFound),
		Err(err) => {
			inspect(&err);
			Err(Error::DbError)
		}
	}
}

/// Map an optional-row query result
pub(crate) fn map_opt<T, F>(row: Result<Option<SqliteRow>, sqlx::Error>, f: F) -> BpResult<Option<T>>
where
	F: FnOnce(SqliteRow) -> Result<T, sqlx::Error>,
{
	match row {
		Ok(Some(row)) => f(row).map(Some).inspect_err(inspect).map_err(|_| Error::DbError),
		Ok(None) => Ok(None),
		Err(err) => {
			inspect(&err);
			Err(Error::DbError)
		}
	}
}

/// Collect an iterator of query results, translating errors
pub(crate) fn collect_res<T>(iter: impl Iterator<Item = Result<T, sqlx::Error>>) -> BpResult<Vec<T>> {
	let mut items = Vec::new();
	for item in iter {
		items.push(item.inspect_err(inspect).map_err(|_| Error::DbError)?);
	}
	Ok(items)
}

/// Translate a failed write; unique constraint violations become conflicts
pub(crate) fn map_write_err(kind: &str, err: sqlx::Error) -> Error {
	match &err {
		sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
			debug!("DB: unique violation on {}: {}", kind, db_err.message());
			Error::Conflict(format!("{} already exists", kind))
		}
		_ => {
			inspect(&err);
			Error::DbError
		}
	}
}

// vim: ts=4
