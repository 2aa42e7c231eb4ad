//! User entity and its create/update views.

use serde::{Deserialize, Serialize};

use crate::prelude::*;
use crate::utils::is_valid_timezone;

pub const SUB_MAX_LEN: usize = 36;
pub const NAME_MAX_LEN: usize = 32;
pub const EMAIL_MAX_LEN: usize = 64;
pub const TIMEZONE_MAX_LEN: usize = 32;

fn default_true() -> bool {
	true
}

// User //
//******//
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct User {
	/// Subject identifier issued by the identity provider
	pub sub: String,
	pub full_name: Option<String>,
	pub given_name: Option<String>,
	pub email: String,
	pub age: Option<i64>,
	pub gender: Option<i64>,
	pub timezone: Option<String>,
	pub notifications_enabled: bool,
	pub email_enabled: bool,
	pub is_active: bool,
	pub is_superuser: bool,
}

// Validation helpers //
//********************//
fn check_len(field: &str, value: &str, max: usize) -> BpResult<()> {
	if value.chars().count() > max {
		return Err(Error::ValidationError(format!("{} must be at most {} characters", field, max)));
	}
	Ok(())
}

fn check_email(email: &str) -> BpResult<()> {
	check_len("email", email, EMAIL_MAX_LEN)?;
	match email.split_once('@') {
		Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
		_ => Err(Error::ValidationError("Invalid email address".into())),
	}
}

fn check_timezone(tz: &str) -> BpResult<()> {
	check_len("timezone", tz, TIMEZONE_MAX_LEN)?;
	if !is_valid_timezone(tz) {
		return Err(Error::ValidationError("Invalid timezone".into()));
	}
	Ok(())
}

// CreateUser //
//************//
#[derive(Clone, Debug, Deserialize)]
pub struct CreateUser {
	pub sub: String,
	pub full_name: String,
	pub given_name: String,
	pub email: String,
	pub timezone: String,
	#[serde(default)]
	pub age: Option<i64>,
	#[serde(default)]
	pub gender: Option<i64>,
	#[serde(default = "default_true")]
	pub notifications_enabled: bool,
	#[serde(default = "default_true")]
	pub email_enabled: bool,
	#[serde(default = "default_true")]
	pub is_active: bool,
	#[serde(default)]
	pub is_superuser: bool,
}

impl CreateUser {
	/// Minimal view with defaults for every optional field
	pub fn new(
		sub: impl Into<String>,
		full_name: impl Into<String>,
		given_name: impl Into<String>,
		email: impl Into<String>,
		timezone: impl Into<String>,
	) -> Self {
		Self {
			sub: sub.into(),
			full_name: full_name.into(),
			given_name: given_name.into(),
			email: email.into(),
			timezone: timezone.into(),
			age: None,
			gender: None,
			notifications_enabled: true,
			email_enabled: true,
			is_active: true,
			is_superuser: false,
		}
	}

	pub fn validate(&self) -> BpResult<()> {
		if self.sub.is_empty() {
			return Err(Error::ValidationError("sub must not be empty".into()));
		}
		check_len("sub", &self.sub, SUB_MAX_LEN)?;
		check_len("full_name", &self.full_name, NAME_MAX_LEN)?;
		check_len("given_name", &self.given_name, NAME_MAX_LEN)?;
		check_email(&self.email)?;
		check_timezone(&self.timezone)
	}

	pub fn to_user(&self) -> User {
		User {
			sub: self.sub.clone(),
			full_name: Some(self.full_name.clone()),
			given_name: Some(self.given_name.clone()),
			email: self.email.clone(),
			age: self.age,
			gender: self.gender,
			timezone: Some(self.timezone.clone()),
			notifications_enabled: self.notifications_enabled,
			email_enabled: self.email_enabled,
			is_active: self.is_active,
			is_superuser: self.is_superuser,
		}
	}
}

// UpdateUser //
//************//
/// Partial user update. `sub` is not part of the view; if a client sends it,
/// it is ignored.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateUser {
	pub full_name: Patch<String>,
	pub given_name: Patch<String>,
	pub email: Patch<String>,
	pub age: Patch<i64>,
	pub gender: Patch<i64>,
	pub timezone: Patch<String>,
	pub notifications_enabled: Patch<bool>,
	pub email_enabled: Patch<bool>,
	pub is_active: Patch<bool>,
	pub is_superuser: Patch<bool>,
}

impl UpdateUser {
	pub fn is_empty(&self) -> bool {
		self.full_name.is_undefined()
			&& self.given_name.is_undefined()
			&& self.email.is_undefined()
			&& self.age.is_undefined()
			&& self.gender.is_undefined()
			&& self.timezone.is_undefined()
			&& self.notifications_enabled.is_undefined()
			&& self.email_enabled.is_undefined()
			&& self.is_active.is_undefined()
			&& self.is_superuser.is_undefined()
	}

	/// True if the view grants superuser rights
	pub fn grants_superuser(&self) -> bool {
		matches!(self.is_superuser, Patch::Value(true))
	}

	pub fn validate(&self) -> BpResult<()> {
		if let Patch::Value(name) = &self.full_name {
			check_len("full_name", name, NAME_MAX_LEN)?;
		}
		if let Patch::Value(name) = &self.given_name {
			check_len("given_name", name, NAME_MAX_LEN)?;
		}
		match &self.email {
			Patch::Null => return Err(Error::ValidationError("email cannot be null".into())),
			Patch::Value(email) => check_email(email)?,
			Patch::Undefined => {}
		}
		if let Patch::Value(tz) = &self.timezone {
			check_timezone(tz)?;
		}
		for (field, patch) in [
			("notifications_enabled", &self.notifications_enabled),
			("email_enabled", &self.email_enabled),
			("is_active", &self.is_active),
			("is_superuser", &self.is_superuser),
		] {
			if patch.is_null() {
				return Err(Error::ValidationError(format!("{} cannot be null", field)));
			}
		}
		Ok(())
	}

	/// Apply the supplied fields onto `user`; undefined fields are left untouched.
	pub fn apply(&self, user: &mut User) {
		self.full_name.clone().apply_to(&mut user.full_name);
		self.given_name.clone().apply_to(&mut user.given_name);
		if let Patch::Value(email) = &self.email {
			user.email.clone_from(email);
		}
		self.age.clone().apply_to(&mut user.age);
		self.gender.clone().apply_to(&mut user.gender);
		self.timezone.clone().apply_to(&mut user.timezone);
		if let Patch::Value(v) = self.notifications_enabled {
			user.notifications_enabled = v;
		}
		if let Patch::Value(v) = self.email_enabled {
			user.email_enabled = v;
		}
		if let Patch::Value(v) = self.is_active {
			user.is_active = v;
		}
		if let Patch::Value(v) = self.is_superuser {
			user.is_superuser = v;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_create_user_defaults() {
		let view: CreateUser = serde_json::from_value(serde_json::json!({
			"sub": "b7a1c2d3-0000-4000-8000-000000000001",
			"full_name": "Ada Lovelace",
			"given_name": "Ada",
			"email": "ada@example.com",
			"timezone": "Europe/London",
		}))
		.unwrap();
		assert!(view.validate().is_ok());
		let user = view.to_user();
		assert!(user.notifications_enabled);
		assert!(user.email_enabled);
		assert!(user.is_active);
		assert!(!user.is_superuser);
		assert_eq!(user.age, None);
	}

	#[test]
	fn test_create_user_rejects_bad_fields() {
		let mut view = CreateUser::new("sub-1", "Ada", "Ada", "not-an-email", "UTC");
		assert!(matches!(view.validate(), Err(Error::ValidationError(_))));

		view.email = "ada@example.com".into();
		view.timezone = "Mars/Olympus".into();
		assert!(matches!(view.validate(), Err(Error::ValidationError(_))));

		view.timezone = "UTC".into();
		view.full_name = "x".repeat(NAME_MAX_LEN + 1);
		assert!(matches!(view.validate(), Err(Error::ValidationError(_))));
	}

	#[test]
	fn test_update_user_ignores_sub_and_applies_present_fields() {
		let view: UpdateUser = serde_json::from_value(serde_json::json!({
			"sub": "someone-else",
			"given_name": "Augusta",
			"age": null,
		}))
		.unwrap();
		assert!(view.validate().is_ok());

		let mut user = CreateUser::new("sub-1", "Ada Lovelace", "Ada", "ada@example.com", "UTC").to_user();
		user.age = Some(36);
		view.apply(&mut user);
		assert_eq!(user.sub, "sub-1");
		assert_eq!(user.given_name.as_deref(), Some("Augusta"));
		assert_eq!(user.full_name.as_deref(), Some("Ada Lovelace"));
		assert_eq!(user.age, None);
	}

	#[test]
	fn test_update_user_rejects_null_flags() {
		let view: UpdateUser =
			serde_json::from_value(serde_json::json!({ "is_active": null })).unwrap();
		assert!(matches!(view.validate(), Err(Error::ValidationError(_))));

		let view: UpdateUser = serde_json::from_value(serde_json::json!({})).unwrap();
		assert!(view.is_empty());
	}
}

// vim: ts=4
