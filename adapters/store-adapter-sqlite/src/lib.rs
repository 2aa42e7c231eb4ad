//! SQLite implementation of the Backplate record store.
//!
//! Every entity lives in its own table with `id`, `version`, `created`,
//! `modified` and `deleted` columns. Removal only sets `deleted`; updates are
//! guarded by the version the caller read.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

mod entity;
mod schema;
mod user;
mod utils;

use std::{path::Path, str::FromStr, time::Duration};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use backplate::prelude::*;
use backplate::store_adapter::{CrudAdapter, ListOptions, Record, UserAdapter};
use backplate::user::{CreateUser, UpdateUser, User};

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

fn db_error(err: sqlx::Error) -> Error {
	warn!("DbError: {:#?}", err);
	Error::DbError
}

#[derive(Debug)]
pub struct StoreAdapterSqlite {
	db: SqlitePool,
}

impl StoreAdapterSqlite {
	/// Open (or create) a database file at `path`
	pub async fn new(path: impl AsRef<Path>) -> BpResult<Self> {
		let opts = SqliteConnectOptions::new().filename(path.as_ref());
		Self::open_file(opts).await
	}

	/// Open a database from a `sqlite:` URL, e.g. `sqlite://backplate.db`
	/// or `sqlite::memory:`
	pub async fn connect(url: &str) -> BpResult<Self> {
		if url.contains(":memory:") || url.contains("mode=memory") {
			return Self::new_in_memory().await;
		}
		let opts = SqliteConnectOptions::from_str(url)
			.map_err(|err| Error::ConfigError(format!("invalid database url {}: {}", url, err)))?;
		Self::open_file(opts).await
	}

	async fn open_file(opts: SqliteConnectOptions) -> BpResult<Self> {
		if let Some(parent) = opts.get_filename().parent().filter(|p| !p.as_os_str().is_empty()) {
			tokio::fs::create_dir_all(parent).await?;
		}
		let opts = opts.create_if_missing(true).journal_mode(SqliteJournalMode::Wal);
		let db = SqlitePoolOptions::new()
			.max_connections(MAX_CONNECTIONS)
			.acquire_timeout(ACQUIRE_TIMEOUT)
			.connect_with(opts)
			.await
			.map_err(db_error)?;
		Self::init(db).await
	}

	/// Private in-memory database. It lives as long as its single connection,
	/// so that connection is never recycled.
	pub async fn new_in_memory() -> BpResult<Self> {
		let opts = SqliteConnectOptions::from_str("sqlite::memory:").map_err(db_error)?;
		let db = SqlitePoolOptions::new()
			.max_connections(1)
			.min_connections(1)
			.idle_timeout(None)
			.max_lifetime(None)
			.connect_with(opts)
			.await
			.map_err(db_error)?;
		Self::init(db).await
	}

	async fn init(db: SqlitePool) -> BpResult<Self> {
		schema::init_db(&db).await.map_err(db_error)?;
		debug!("store initialized, schema version {}", schema::SCHEMA_VERSION);
		Ok(Self { db })
	}
}

#[async_trait]
impl CrudAdapter<User> for StoreAdapterSqlite {
	async fn get(&self, id: RecordId) -> BpResult<Option<Record<User>>> {
		entity::get(&self.db, id, false).await
	}

	async fn get_including_deleted(&self, id: RecordId) -> BpResult<Option<Record<User>>> {
		entity::get(&self.db, id, true).await
	}

	async fn list(&self, opts: &ListOptions) -> BpResult<Vec<Record<User>>> {
		entity::list(&self.db, opts).await
	}

	async fn create(&self, view: &CreateUser) -> BpResult<Record<User>> {
		view.validate()?;
		entity::create(&self.db, view).await
	}

	async fn update(&self, existing: &Record<User>, view: &UpdateUser) -> BpResult<Record<User>> {
		view.validate()?;
		entity::update(&self.db, existing, view).await
	}

	async fn remove(&self, id: RecordId) -> BpResult<Record<User>> {
		entity::remove(&self.db, id).await
	}
}

#[async_trait]
impl UserAdapter for StoreAdapterSqlite {
	async fn get_by_sub(&self, sub: &str) -> BpResult<Option<Record<User>>> {
		entity::get_by(&self.db, "sub", sub).await
	}
}

// vim: ts=4
