//! Custom extractors for authenticated requests

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use backplate_types::store_adapter::{Record, UserAdapter};
use backplate_types::user::User;

use crate::auth::VerifiedCredential;
use crate::prelude::*;

// Auth //
//******//
#[derive(Debug, Clone)]
pub struct Auth(pub VerifiedCredential);

impl<S> FromRequestParts<S> for Auth
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		if let Some(auth) = parts.extensions.get::<Auth>().cloned() {
			Ok(auth)
		} else {
			Err(Error::Unauthorized("Not authenticated".into()))
		}
	}
}

// CurrentUser //
//*************//
/// User owning the credential's `sub`
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Record<User>);

impl FromRequestParts<App> for CurrentUser {
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, state: &App) -> Result<Self, Self::Rejection> {
		let Auth(credential) = Auth::from_request_parts(parts, state).await?;
		let sub = credential
			.sub()
			.ok_or_else(|| Error::Unauthorized("token has no subject".into()))?;
		match state.users.get_by_sub(sub).await? {
			Some(user) => Ok(CurrentUser(user)),
			None => {
				debug!("no user for sub {}", sub);
				Err(Error::NotFound)
			}
		}
	}
}

// ActiveUser //
//************//
#[derive(Debug, Clone)]
pub struct ActiveUser(pub Record<User>);

impl FromRequestParts<App> for ActiveUser {
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, state: &App) -> Result<Self, Self::Rejection> {
		let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
		if !user.data.is_active {
			return Err(Error::ValidationError("Inactive user".into()));
		}
		Ok(ActiveUser(user))
	}
}

// Superuser //
//***********//
#[derive(Debug, Clone)]
pub struct Superuser(pub Record<User>);

impl FromRequestParts<App> for Superuser {
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, state: &App) -> Result<Self, Self::Rejection> {
		let ActiveUser(user) = ActiveUser::from_request_parts(parts, state).await?;
		if !user.data.is_superuser {
			return Err(Error::PermissionDenied);
		}
		Ok(Superuser(user))
	}
}

// vim: ts=4
