//! Database schema initialization

use sqlx::SqlitePool;

pub(crate) const SCHEMA_VERSION: i64 = 1;

/// Initialize the database schema with all required tables and indexes
pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS globals (
			key text NOT NULL,
			value text,
			PRIMARY KEY(key)
	)",
	)
	.execute(&mut *tx)
	.await?;

	// Users
	//*******
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS users (
		id integer PRIMARY KEY AUTOINCREMENT,
		version integer NOT NULL,
		created integer NOT NULL,
		modified integer NOT NULL,
		deleted boolean NOT NULL DEFAULT 0,
		sub varchar(36) NOT NULL,
		full_name varchar(32),
		given_name varchar(32),
		email varchar(64) NOT NULL,
		age integer,
		gender integer,
		timezone varchar(32),
		notifications_enabled boolean NOT NULL DEFAULT 1,
		email_enabled boolean NOT NULL DEFAULT 1,
		is_active boolean NOT NULL DEFAULT 1,
		is_superuser boolean NOT NULL DEFAULT 0
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_users_sub ON users(sub)")
		.execute(&mut *tx)
		.await?;
	sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users(email)")
		.execute(&mut *tx)
		.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_created ON users(created, id)")
		.execute(&mut *tx)
		.await?;

	sqlx::query("INSERT OR IGNORE INTO globals (key, value) VALUES ('schema_version', ?)")
		.bind(SCHEMA_VERSION.to_string())
		.execute(&mut *tx)
		.await?;

	tx.commit().await?;
	Ok(())
}

// vim: ts=4
