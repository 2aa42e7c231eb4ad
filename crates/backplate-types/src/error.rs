//! Error taxonomy shared by every Backplate crate.
//!
//! Each variant maps to exactly one HTTP status in [`IntoResponse`]; startup
//! code treats `ConfigError` as fatal.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

pub type BpResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	/// Settings file missing, malformed, or a required key absent
	ConfigError(String),
	/// Credential failure: missing/malformed token, unknown key, bad signature
	Unauthorized(String),
	/// Authenticated, but not allowed to perform the operation
	PermissionDenied,
	/// Request payload or state rejected
	ValidationError(String),
	NotFound,
	/// Optimistic lock failure or unique constraint violation
	Conflict(String),
	/// Transient failure of an external dependency (messaging, secret store, key endpoint)
	ServiceUnavailable(String),
	DbError,
	Internal(String),

	// externals
	Io(std::io::Error),
}

impl Error {
	pub fn code(&self) -> &'static str {
		match self {
			Error::ConfigError(_) => "E-CONFIG",
			Error::Unauthorized(_) => "E-AUTH-FORBIDDEN",
			Error::PermissionDenied => "E-AUTH-NOPERM",
			Error::ValidationError(_) => "E-VALIDATION",
			Error::NotFound => "E-NOT-FOUND",
			Error::Conflict(_) => "E-CONFLICT",
			Error::ServiceUnavailable(_) => "E-UNAVAILABLE",
			Error::DbError => "E-DB",
			Error::Internal(_) | Error::Io(_) => "E-INTERNAL",
		}
	}

	pub fn status(&self) -> StatusCode {
		match self {
			Error::Unauthorized(_) => StatusCode::FORBIDDEN,
			Error::PermissionDenied | Error::ValidationError(_) => StatusCode::BAD_REQUEST,
			Error::NotFound => StatusCode::NOT_FOUND,
			Error::Conflict(_) => StatusCode::CONFLICT,
			Error::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
			Error::ConfigError(_) | Error::DbError | Error::Internal(_) | Error::Io(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Error::ConfigError(msg) => write!(f, "configuration error: {}", msg),
			Error::Unauthorized(msg) => write!(f, "unauthorized: {}", msg),
			Error::PermissionDenied => write!(f, "The user doesn't have enough privileges"),
			Error::ValidationError(msg) => write!(f, "{}", msg),
			Error::NotFound => write!(f, "not found"),
			Error::Conflict(msg) => write!(f, "conflict: {}", msg),
			Error::ServiceUnavailable(msg) => write!(f, "service unavailable: {}", msg),
			Error::DbError => write!(f, "database error"),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
			Error::Io(err) => write!(f, "io error: {}", err),
		}
	}
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::Internal(format!("json: {}", err))
	}
}

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let status = self.status();
		// Internal details stay in the logs
		let message = match &self {
			Error::DbError | Error::Internal(_) | Error::Io(_) | Error::ConfigError(_) => {
				tracing::error!("request failed: {}", self);
				"Internal server error".to_string()
			}
			Error::Unauthorized(_) => "Could not validate credentials".to_string(),
			_ => self.to_string(),
		};
		let body = serde_json::json!({
			"error": {
				"code": self.code(),
				"message": message,
			}
		});
		(status, Json(body)).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_mapping() {
		assert_eq!(Error::Unauthorized("x".into()).status(), StatusCode::FORBIDDEN);
		assert_eq!(Error::PermissionDenied.status(), StatusCode::BAD_REQUEST);
		assert_eq!(Error::ValidationError("x".into()).status(), StatusCode::BAD_REQUEST);
		assert_eq!(Error::NotFound.status(), StatusCode::NOT_FOUND);
		assert_eq!(Error::Conflict("x".into()).status(), StatusCode::CONFLICT);
		assert_eq!(Error::ServiceUnavailable("x".into()).status(), StatusCode::SERVICE_UNAVAILABLE);
		assert_eq!(Error::DbError.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}

	#[test]
	fn test_into_response_status() {
		let res = Error::NotFound.into_response();
		assert_eq!(res.status(), StatusCode::NOT_FOUND);

		let res = Error::Unauthorized("bad signature".into()).into_response();
		assert_eq!(res.status(), StatusCode::FORBIDDEN);
	}
}

// vim: ts=4
