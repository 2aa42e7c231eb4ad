//! User table mapping

use sqlx::{QueryBuilder, Row, Sqlite, sqlite::SqliteRow};

use backplate::prelude::*;
use backplate::user::{CreateUser, UpdateUser, User};

use crate::entity::SqliteEntity;
use crate::utils::push_patch;

impl SqliteEntity for User {
	const TABLE: &'static str = "users";
	const COLUMNS: &'static str = "sub, full_name, given_name, email, age, gender, timezone, \
		notifications_enabled, email_enabled, is_active, is_superuser";

	fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
		Ok(User {
			sub: row.try_get("sub")?,
			full_name: row.try_get("full_name")?,
			given_name: row.try_get("given_name")?,
			email: row.try_get("email")?,
			age: row.try_get("age")?,
			gender: row.try_get("gender")?,
			timezone: row.try_get("timezone")?,
			notifications_enabled: row.try_get("notifications_enabled")?,
			email_enabled: row.try_get("email_enabled")?,
			is_active: row.try_get("is_active")?,
			is_superuser: row.try_get("is_superuser")?,
		})
	}

	fn push_create_values<'a>(query: &mut QueryBuilder<'a, Sqlite>, view: &'a CreateUser) {
		let mut values = query.separated(", ");
		values
			.push_bind(&view.sub)
			.push_bind(&view.full_name)
			.push_bind(&view.given_name)
			.push_bind(&view.email)
			.push_bind(view.age)
			.push_bind(view.gender)
			.push_bind(&view.timezone)
			.push_bind(view.notifications_enabled)
			.push_bind(view.email_enabled)
			.push_bind(view.is_active)
			.push_bind(view.is_superuser);
	}

	fn push_update<'a>(query: &mut QueryBuilder<'a, Sqlite>, view: &'a UpdateUser) -> bool {
		let mut has_updates = false;
		has_updates = push_patch!(query, has_updates, "full_name", &view.full_name);
		has_updates = push_patch!(query, has_updates, "given_name", &view.given_name);
		has_updates = push_patch!(query, has_updates, "email", &view.email);
		has_updates = push_patch!(query, has_updates, "age", &view.age);
		has_updates = push_patch!(query, has_updates, "gender", &view.gender);
		has_updates = push_patch!(query, has_updates, "timezone", &view.timezone);
		has_updates =
			push_patch!(query, has_updates, "notifications_enabled", &view.notifications_enabled);
		has_updates = push_patch!(query, has_updates, "email_enabled", &view.email_enabled);
		has_updates = push_patch!(query, has_updates, "is_active", &view.is_active);
		has_updates = push_patch!(query, has_updates, "is_superuser", &view.is_superuser);
		has_updates
	}
}

// vim: ts=4
