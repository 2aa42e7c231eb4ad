//! Generic record operations shared by every entity table
//!
//! Every table carries `id`, `version`, `created`, `modified`, `deleted`
//! followed by the entity's own columns. Writes are guarded by the version
//! the caller last read: an update whose `WHERE id=? AND version=?` matches no
//! row on an existing record is a conflict.

use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool, sqlite::SqliteRow};

use backplate::prelude::*;
use backplate::store_adapter::{Entity, ListOptions, Record, RecordMeta, RecordState};

use crate::utils::{collect_res, inspect, map_opt, map_res, map_write_err};

const META_COLUMNS: &str = "id, version, created, modified, deleted";

/// Table mapping of an entity
pub(crate) trait SqliteEntity: Entity {
	const TABLE: &'static str;
	/// Entity columns, in the order `push_create_values` binds them
	const COLUMNS: &'static str;

	fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error>;

	/// Push the comma-separated bound values for `COLUMNS`
	fn push_create_values<'a>(query: &mut QueryBuilder<'a, Sqlite>, view: &'a Self::Create);

	/// Push `, column=?` for every field present in `view`.
	/// Returns false if the view carries no field.
	fn push_update<'a>(query: &mut QueryBuilder<'a, Sqlite>, view: &'a Self::Update) -> bool;
}

fn meta_from_row(row: &SqliteRow) -> Result<RecordMeta, sqlx::Error> {
	let version: i64 = row.try_get("version")?;
	Ok(RecordMeta {
		id: RecordId(row.try_get("id")?),
		version: u32::try_from(version).map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
		created: Timestamp(row.try_get("created")?),
		modified: Timestamp(row.try_get("modified")?),
		state: RecordState::from_deleted(row.try_get("deleted")?),
	})
}

fn record_from_row<E: SqliteEntity>(row: &SqliteRow) -> Result<Record<E>, sqlx::Error> {
	Ok(Record { meta: meta_from_row(row)?, data: E::from_row(row)? })
}

fn select<'a, E: SqliteEntity>() -> QueryBuilder<'a, Sqlite> {
	QueryBuilder::new(format!("SELECT {}, {} FROM {} WHERE ", META_COLUMNS, E::COLUMNS, E::TABLE))
}

pub(crate) async fn get<E: SqliteEntity>(
	db: &SqlitePool,
	id: RecordId,
	include_deleted: bool,
) -> BpResult<Option<Record<E>>> {
	let mut query = select::<E>();
	query.push("id=").push_bind(id.0);
	if !include_deleted {
		query.push(" AND deleted=0");
	}
	let res = query.build().fetch_optional(db).await;
	map_opt(res, |row| record_from_row(&row))
}

/// Non-deleted record whose `column` equals `value`
pub(crate) async fn get_by<E: SqliteEntity>(
	db: &SqlitePool,
	column: &'static str,
	value: &str,
) -> BpResult<Option<Record<E>>> {
	let mut query = select::<E>();
	query.push(column).push("=").push_bind(value).push(" AND deleted=0");
	let res = query.build().fetch_optional(db).await;
	map_opt(res, |row| record_from_row(&row))
}

pub(crate) async fn list<E: SqliteEntity>(
	db: &SqlitePool,
	opts: &ListOptions,
) -> BpResult<Vec<Record<E>>> {
	let mut query = select::<E>();
	query
		.push("deleted=0 ORDER BY created, id LIMIT ")
		.push_bind(i64::from(opts.effective_limit()))
		.push(" OFFSET ")
		.push_bind(i64::from(opts.offset));
	let rows = query.build().fetch_all(db).await.inspect_err(inspect).map_err(|_| Error::DbError)?;
	collect_res(rows.iter().map(record_from_row::<E>))
}

pub(crate) async fn create<E: SqliteEntity>(db: &SqlitePool, view: &E::Create) -> BpResult<Record<E>> {
	let now = Timestamp::now();
	let mut query = QueryBuilder::new(format!(
		"INSERT INTO {} (version, created, modified, deleted, {}) VALUES (1, ",
		E::TABLE,
		E::COLUMNS
	));
	query.push_bind(now.0).push(", ").push_bind(now.0).push(", 0, ");
	E::push_create_values(&mut query, view);
	query.push(") RETURNING id");

	let res = query.build().fetch_one(db).await.map_err(|err| map_write_err(E::KIND, err))?;
	let id = RecordId(res.try_get::<i64, _>("id").inspect_err(inspect).map_err(|_| Error::DbError)?);
	debug!("created {} {}", E::KIND, id);

	get::<E>(db, id, true).await?.ok_or(Error::NotFound)
}

/// Distinguish a lost version race from a missing row after a guarded write
/// matched nothing
async fn guard_failed<E: SqliteEntity>(db: &SqlitePool, id: RecordId, version: u32) -> Error {
	let res = sqlx::query(&format!("SELECT version FROM {} WHERE id=?", E::TABLE))
		.bind(id.0)
		.fetch_one(db)
		.await;
	match map_res(res, |row| row.try_get::<i64, _>("version")) {
		Ok(current) => {
			info!("{} {} changed concurrently: expected version {}, found {}", E::KIND, id, version, current);
			Error::Conflict(format!("{} {} was modified by another request", E::KIND, id))
		}
		Err(err) => err,
	}
}

pub(crate) async fn update<E: SqliteEntity>(
	db: &SqlitePool,
	existing: &Record<E>,
	view: &E::Update,
) -> BpResult<Record<E>> {
	let id = existing.meta.id;
	let modified = Timestamp::now_after(existing.meta.modified);

	let mut query = QueryBuilder::new(format!("UPDATE {} SET version=version+1, modified=", E::TABLE));
	query.push_bind(modified.0);
	if !E::push_update(&mut query, view) {
		debug!("update of {} {} carries no fields", E::KIND, id);
	}
	query
		.push(" WHERE id=")
		.push_bind(id.0)
		.push(" AND version=")
		.push_bind(i64::from(existing.meta.version));

	let res = query.build().execute(db).await.map_err(|err| map_write_err(E::KIND, err))?;
	if res.rows_affected() == 0 {
		return Err(guard_failed::<E>(db, id, existing.meta.version).await);
	}

	get::<E>(db, id, true).await?.ok_or(Error::NotFound)
}

pub(crate) async fn remove<E: SqliteEntity>(db: &SqlitePool, id: RecordId) -> BpResult<Record<E>> {
	let existing = get::<E>(db, id, false).await?.ok_or(Error::NotFound)?;
	let modified = Timestamp::now_after(existing.meta.modified);

	let res = sqlx::query(&format!(
		"UPDATE {} SET deleted=1, version=version+1, modified=? WHERE id=? AND version=?",
		E::TABLE
	))
	.bind(modified.0)
	.bind(id.0)
	.bind(i64::from(existing.meta.version))
	.execute(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;
	if res.rows_affected() == 0 {
		return Err(guard_failed::<E>(db, id, existing.meta.version).await);
	}
	debug!("removed {} {}", E::KIND, id);

	get::<E>(db, id, true).await?.ok_or(Error::NotFound)
}

// vim: ts=4
