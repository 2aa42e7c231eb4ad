use axum::{
	Json,
	extract::{Path, Query, State},
	http::StatusCode,
};

use crate::prelude::*;
use crate::store_adapter::{CrudAdapter, ListOptions, Record, UserAdapter};
use crate::user::{CreateUser, UpdateUser, User};
use backplate_core::extract::{ActiveUser, Auth, Superuser};

type UserResult = BpResult<(StatusCode, Json<Record<User>>)>;

/// List users (superuser only)
pub async fn list_users(
	State(app): State<App>,
	Superuser(_): Superuser,
	Query(opts): Query<ListOptions>,
) -> BpResult<(StatusCode, Json<Vec<Record<User>>>)> {
	let users = app.users.list(&opts).await?;
	Ok((StatusCode::OK, Json(users)))
}

/// Register the record of the authenticated subject
pub async fn post_user(
	State(app): State<App>,
	Auth(credential): Auth,
	Json(view): Json<CreateUser>,
) -> UserResult {
	let sub = credential
		.sub()
		.ok_or_else(|| Error::Unauthorized("token has no subject".into()))?;

	if app.users.get_by_sub(&view.sub).await?.is_some() {
		return Err(Error::ValidationError(
			"The user with this sub already exists in the system".into(),
		));
	}
	if view.sub != sub {
		return Err(Error::ValidationError("The sub does not match the authenticated user".into()));
	}
	if view.is_superuser {
		return Err(Error::PermissionDenied);
	}

	let user = app.users.create(&view).await?;
	info!("created user {} for sub {}", user.id(), user.data.sub);
	Ok((StatusCode::OK, Json(user)))
}

pub async fn get_me(ActiveUser(user): ActiveUser) -> UserResult {
	Ok((StatusCode::OK, Json(user)))
}

pub async fn patch_me(
	State(app): State<App>,
	ActiveUser(user): ActiveUser,
	Json(view): Json<UpdateUser>,
) -> UserResult {
	if view.grants_superuser() && !user.data.is_superuser {
		return Err(Error::PermissionDenied);
	}
	let user = app.users.update(&user, &view).await?;
	Ok((StatusCode::OK, Json(user)))
}

/// Own record, or any record for superusers
pub async fn get_user(
	State(app): State<App>,
	ActiveUser(current): ActiveUser,
	Path(id): Path<RecordId>,
) -> UserResult {
	if current.id() == id {
		return Ok((StatusCode::OK, Json(current)));
	}
	if !current.data.is_superuser {
		return Err(Error::PermissionDenied);
	}
	let user = app.users.get(id).await?.ok_or(Error::NotFound)?;
	Ok((StatusCode::OK, Json(user)))
}

pub async fn patch_user(
	State(app): State<App>,
	Superuser(_): Superuser,
	Path(id): Path<RecordId>,
	Json(view): Json<UpdateUser>,
) -> UserResult {
	let existing = app.users.get(id).await?.ok_or(Error::NotFound)?;
	let user = app.users.update(&existing, &view).await?;
	info!("user {} updated to version {}", user.id(), user.version());
	Ok((StatusCode::OK, Json(user)))
}

/// Soft delete
pub async fn delete_user(
	State(app): State<App>,
	Superuser(current): Superuser,
	Path(id): Path<RecordId>,
) -> UserResult {
	let user = app.users.remove(id).await?;
	info!("user {} removed by {}", user.id(), current.id());
	Ok((StatusCode::OK, Json(user)))
}

// vim: ts=4
