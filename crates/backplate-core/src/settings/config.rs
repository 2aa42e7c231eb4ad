//! Typed application configuration, built once from resolved settings

use std::collections::BTreeMap;

use super::value::{SettingValue, Settings};
use crate::prelude::*;

pub const DEFAULT_API_PREFIX: &str = "/api/v1";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8000";
pub const DEFAULT_RETRY_COUNT: u32 = 3;
pub const DEFAULT_LEEWAY_SECONDS: u64 = 60;

#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
	/// Root level; falls back to an environment-dependent default
	pub root_level: Option<String>,
	/// Per-target levels, e.g. `sqlx = "WARNING"`
	pub targets: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct SlackConfig {
	pub enabled: bool,
	pub api_token: Option<String>,
	pub channel_id: Option<String>,
	/// Delivery attempts before giving up
	pub retry_count: u32,
}

impl Default for SlackConfig {
	fn default() -> Self {
		Self { enabled: false, api_token: None, channel_id: None, retry_count: DEFAULT_RETRY_COUNT }
	}
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
	pub aws_region: Option<String>,
	pub user_pool_id: Option<String>,
	/// Explicit key set location; overrides the Cognito-derived URL
	pub jwks_url: Option<String>,
	pub allow_local_bypass: bool,
	pub leeway_seconds: u64,
	pub audience: Option<String>,
}

impl Default for AuthConfig {
	fn default() -> Self {
		Self {
			aws_region: None,
			user_pool_id: None,
			jwks_url: None,
			allow_local_bypass: false,
			leeway_seconds: DEFAULT_LEEWAY_SECONDS,
			audience: None,
		}
	}
}

impl AuthConfig {
	/// Key set URL: `jwks_url`, or the Cognito user pool's well-known endpoint
	pub fn jwks_url(&self) -> Option<String> {
		if let Some(url) = &self.jwks_url {
			return Some(url.clone());
		}
		match (&self.aws_region, &self.user_pool_id) {
			(Some(region), Some(pool)) => Some(format!(
				"https://cognito-idp.{}.amazonaws.com/{}/.well-known/jwks.json",
				region, pool
			)),
			_ => None,
		}
	}
}

#[derive(Debug, Clone)]
pub struct AppConfig {
	pub env: String,
	pub project_name: String,
	pub api_prefix: String,
	pub listen: String,
	pub cors_origins: Vec<String>,
	pub database_url: String,
	pub logging: LoggingConfig,
	pub slack: SlackConfig,
	pub auth: AuthConfig,
}

// Typed readers //
//***************//
// Overrides are coerced while resolving, so each reader accepts only the
// declared type.

fn wrong_type(path: &str, expected: &str, value: &SettingValue) -> Error {
	Error::ConfigError(format!(
		"setting '{}' should be {}, found {}",
		path,
		expected,
		value.type_name()
	))
}

fn read_str(settings: &Settings, path: &str) -> BpResult<Option<String>> {
	match settings.try_get(path) {
		None => Ok(None),
		Some(SettingValue::String(s)) if s.is_empty() => Ok(None),
		Some(SettingValue::String(s)) => Ok(Some(s.clone())),
		Some(value) => Err(wrong_type(path, "a string", value)),
	}
}

fn read_bool(settings: &Settings, path: &str) -> BpResult<Option<bool>> {
	match settings.try_get(path) {
		None => Ok(None),
		Some(SettingValue::Bool(b)) => Ok(Some(*b)),
		Some(value) => Err(wrong_type(path, "bool", value)),
	}
}

fn read_uint(settings: &Settings, path: &str) -> BpResult<Option<u64>> {
	match settings.try_get(path) {
		None => Ok(None),
		Some(SettingValue::Int(i)) => u64::try_from(*i).map(Some).map_err(|_| {
			Error::ConfigError(format!("setting '{}' should be a non-negative int", path))
		}),
		Some(value) => Err(wrong_type(path, "a non-negative int", value)),
	}
}

fn read_list(settings: &Settings, path: &str) -> BpResult<Vec<String>> {
	match settings.try_get(path) {
		None => Ok(Vec::new()),
		Some(SettingValue::List(items)) => Ok(items.iter().map(ToString::to_string).collect()),
		Some(value) => Err(wrong_type(path, "a list", value)),
	}
}

impl AppConfig {
	pub fn from_settings(settings: &Settings) -> BpResult<AppConfig> {
		let project_name = read_str(settings, "project_name")?
			.ok_or_else(|| Error::ConfigError("setting 'project_name' is required".into()))?;
		let database_url = read_str(settings, "database_url")?
			.ok_or_else(|| Error::ConfigError("setting 'database_url' is required".into()))?;

		let api_prefix =
			read_str(settings, "api_v1_str")?.unwrap_or_else(|| DEFAULT_API_PREFIX.to_string());
		if !api_prefix.starts_with('/') {
			return Err(Error::ConfigError(format!(
				"setting 'api_v1_str' must start with '/': {}",
				api_prefix
			)));
		}

		let logging = LoggingConfig {
			root_level: read_str(settings, "logging.root_level")?,
			targets: match settings.try_get("logging") {
				Some(SettingValue::Table(table)) => table
					.iter()
					.filter(|(target, _)| target.as_str() != "root_level")
					.map(|(target, level)| (target.clone(), level.to_string()))
					.collect(),
				Some(_) => {
					return Err(Error::ConfigError("setting 'logging' should be a table".into()));
				}
				None => BTreeMap::new(),
			},
		};

		let retry_count = match read_uint(settings, "slack.retry_count")? {
			None => DEFAULT_RETRY_COUNT,
			Some(0) => {
				return Err(Error::ConfigError("setting 'slack.retry_count' must be at least 1".into()));
			}
			Some(n) => u32::try_from(n).unwrap_or(u32::MAX),
		};
		let slack = SlackConfig {
			enabled: read_bool(settings, "slack.enabled")?.unwrap_or(false),
			api_token: read_str(settings, "slack.api_token")?,
			channel_id: read_str(settings, "slack.channel_id")?,
			retry_count,
		};
		if slack.enabled && (slack.api_token.is_none() || slack.channel_id.is_none()) {
			return Err(Error::ConfigError(
				"slack is enabled but 'slack.api_token' or 'slack.channel_id' is missing".into(),
			));
		}

		let auth = AuthConfig {
			aws_region: read_str(settings, "auth.aws_region")?,
			user_pool_id: read_str(settings, "auth.cognito_user_pool_id")?,
			jwks_url: read_str(settings, "auth.jwks_url")?,
			allow_local_bypass: read_bool(settings, "auth.allow_local_bypass")?.unwrap_or(false),
			leeway_seconds: read_uint(settings, "auth.leeway_seconds")?
				.unwrap_or(DEFAULT_LEEWAY_SECONDS),
			audience: read_str(settings, "auth.audience")?,
		};

		Ok(AppConfig {
			env: settings.env().to_string(),
			project_name,
			api_prefix,
			listen: read_str(settings, "listen")?.unwrap_or_else(|| DEFAULT_LISTEN.to_string()),
			cors_origins: read_list(settings, "backend_cors_origins")?,
			database_url,
			logging,
			slack,
			auth,
		})
	}

	/// Whether `?sub=` may stand in for a bearer token
	pub fn local_bypass_enabled(&self) -> bool {
		self.env == "local" && self.auth.allow_local_bypass
	}

	/// Minimal configuration for tests and tools
	pub fn for_env(env: &str, project_name: &str, database_url: &str) -> AppConfig {
		AppConfig {
			env: env.to_string(),
			project_name: project_name.to_string(),
			api_prefix: DEFAULT_API_PREFIX.to_string(),
			listen: DEFAULT_LISTEN.to_string(),
			cors_origins: Vec::new(),
			database_url: database_url.to_string(),
			logging: LoggingConfig::default(),
			slack: SlackConfig::default(),
			auth: AuthConfig::default(),
		}
	}
}


// vim: ts=4
