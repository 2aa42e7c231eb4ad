//! Settings file resolution.
//!
//! The settings file is TOML with a mandatory `[default]` table plus one table
//! per environment (`[local]`, `[dev]`, `[prd]`, nested `[local.slack]`, ...).
//! `default` is applied first, then every top-level table whose name starts
//! with the active environment name, in file order. Per leaf key the first
//! matching rule wins:
//!
//! 1. environment override: `KEY` for top-level keys, `PARENT_KEY` for nested
//!    keys, coerced to the type declared in the file. A value that does not
//!    parse as that type fails resolution with `ConfigError`.
//! 2. table: resolved recursively
//! 3. `"${VAR}"`: substituted from the environment, dropped if `VAR` is unset
//! 4. `"ssm:<path>"`: fetched from the secret store, skipped on failure
//! 5. anything else is taken literally

use std::collections::BTreeMap;
use std::path::Path;

use super::source::{EnvSource, ProcessEnv, SecretStore, SsmSecretStore, DEFAULT_SSM_REGION};
use super::value::{SettingValue, Settings};
use crate::prelude::*;

pub const DEFAULT_SECTION: &str = "default";
pub const DEFAULT_ENV: &str = "local";
pub const PROJECT_ENV_VAR: &str = "PROJECT_ENV";
const SECRET_PREFIX: &str = "ssm:";

/// Active environment name: `PROJECT_ENV`, or `local` if unset
pub fn project_env(env: &dyn EnvSource) -> String {
	env.var(PROJECT_ENV_VAR)
		.filter(|v| !v.is_empty())
		.unwrap_or_else(|| DEFAULT_ENV.to_string())
}

fn convert(value: &toml::Value) -> SettingValue {
	match value {
		toml::Value::String(s) => SettingValue::String(s.clone()),
		toml::Value::Integer(i) => SettingValue::Int(*i),
		toml::Value::Float(f) => SettingValue::Float(*f),
		toml::Value::Boolean(b) => SettingValue::Bool(*b),
		toml::Value::Datetime(dt) => SettingValue::String(dt.to_string()),
		toml::Value::Array(items) => SettingValue::List(items.iter().map(convert).collect()),
		toml::Value::Table(table) => SettingValue::Table(
			table.iter().map(|(k, v)| (k.clone(), convert(v))).collect::<BTreeMap<_, _>>(),
		),
	}
}

/// `${VAR}` placeholder name, if `s` is one
fn placeholder(s: &str) -> Option<&str> {
	s.strip_prefix("${").and_then(|rest| rest.strip_suffix('}'))
}

struct Pending<'a> {
	path: String,
	parent: Option<&'a str>,
	key: &'a str,
	value: &'a toml::Value,
}

struct Resolver<'a> {
	env: &'a dyn EnvSource,
	secrets: &'a dyn SecretStore,
}

impl Resolver<'_> {
	/// Env override for `item`, coerced to the type the file declares.
	/// Tables are never overridden as a whole.
	fn env_override(&self, item: &Pending<'_>) -> BpResult<Option<SettingValue>> {
		if item.value.is_table() {
			return Ok(None);
		}
		let name = match item.parent {
			None => item.key.to_uppercase(),
			Some(parent) => format!("{}_{}", parent.to_uppercase(), item.key.to_uppercase()),
		};
		let Some(raw) = self.env.var(&name) else {
			return Ok(None);
		};
		let declared = convert(item.value);
		match declared.coerce_like(&raw) {
			Some(value) => Ok(Some(value)),
			None => Err(Error::ConfigError(format!(
				"could not cast {}={} to type {} of setting {}",
				name,
				raw,
				declared.type_name(),
				item.path
			))),
		}
	}

	async fn resolve_table<'v>(
		&self,
		settings: &mut Settings,
		table: &'v toml::Table,
	) -> BpResult<()> {
		let mut stack: Vec<Pending<'v>> = table
			.iter()
			.rev()
			.map(|(key, value)| Pending { path: key.clone(), parent: None, key, value })
			.collect();

		while let Some(item) = stack.pop() {
			if let Some(value) = self.env_override(&item)? {
				settings.set(&item.path, value);
				continue;
			}
			match item.value {
				toml::Value::Table(children) => {
					for (key, value) in children.iter().rev() {
						stack.push(Pending {
							path: format!("{}.{}", item.path, key),
							parent: Some(item.key),
							key,
							value,
						});
					}
				}
				toml::Value::String(s) => {
					if let Some(var) = placeholder(s) {
						match self.env.var(var) {
							Some(v) => settings.set(&item.path, v),
							None => debug!("setting {} dropped: ${{{}}} is not set", item.path, var),
						}
					} else if let Some(secret_path) = s.strip_prefix(SECRET_PREFIX) {
						match self.secrets.get_parameter(secret_path).await {
							Ok(Some(v)) => settings.set(&item.path, v),
							Ok(None) => warn!("setting {} skipped: secret {} has no value", item.path, secret_path),
							Err(err) => error!("setting {} skipped: {}", item.path, err),
						}
					} else {
						settings.set(&item.path, s.as_str());
					}
				}
				value => settings.set(&item.path, convert(value)),
			}
		}
		Ok(())
	}
}

/// Resolve the settings in `content` for environment `env_name`
pub async fn resolve(
	content: &str,
	env_name: &str,
	env: &dyn EnvSource,
	secrets: &dyn SecretStore,
) -> BpResult<Settings> {
	let doc: toml::Table = content
		.parse()
		.map_err(|err| Error::ConfigError(format!("invalid settings file: {}", err)))?;

	let Some(default) = doc.get(DEFAULT_SECTION) else {
		return Err(Error::ConfigError(format!(
			"settings file missing required section '{}'",
			DEFAULT_SECTION
		)));
	};

	let sections = std::iter::once((DEFAULT_SECTION, default)).chain(
		doc.iter()
			.filter(|(name, _)| name.as_str() != DEFAULT_SECTION && name.starts_with(env_name))
			.map(|(name, value)| (name.as_str(), value)),
	);

	let resolver = Resolver { env, secrets };
	let mut settings = Settings::new(env_name);
	for (name, section) in sections {
		let Some(table) = section.as_table() else {
			warn!("ignoring top-level key '{}': not a table", name);
			continue;
		};
		debug!("applying settings section [{}]", name);
		resolver.resolve_table(&mut settings, table).await?;
	}

	Ok(settings)
}

/// Read and resolve a settings file
pub async fn load(
	path: impl AsRef<Path>,
	env_name: &str,
	env: &dyn EnvSource,
	secrets: &dyn SecretStore,
) -> BpResult<Settings> {
	let path = path.as_ref();
	let content = tokio::fs::read_to_string(path).await.map_err(|err| {
		Error::ConfigError(format!("could not load settings file {}: {}", path.display(), err))
	})?;
	resolve(&content, env_name, env, secrets).await
}

/// Load settings using the process environment (plus `.env`) and AWS SSM
pub async fn load_from_process_env(path: impl AsRef<Path>) -> BpResult<Settings> {
	let env = ProcessEnv::new();
	let env_name = project_env(&env);
	let region = env.var("AWS_REGION").unwrap_or_else(|| DEFAULT_SSM_REGION.to_string());
	let secrets = SsmSecretStore::new(&region).await;
	info!("loading settings for environment '{}'", env_name);
	load(path, &env_name, &env, &secrets).await
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::settings::source::{MapSecretStore, NoSecretStore};
	use std::collections::HashMap;

	const SETTINGS: &str = r#"
[default]
project_name = "backplate"
api_v1_str = "/api/v1"

[default.slack]
enabled = false
retry_count = 3
channel_id = "C-DEFAULT"

[local]
database_url = "${DATABASE_URL}"
missing = "${NOT_SET_ANYWHERE}"

[local.slack]
channel_id = "C-LOCAL"
api_token = "ssm:/backplate/slack/token"

[local.auth]
leeway_seconds = 1.5
cognito_user_pool_id = "${POOL}"

[prd]
project_name = "production"
"#;

	fn env(vars: &[(&str, &str)]) -> HashMap<String, String> {
		vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
	}

	#[tokio::test]
	async fn test_sections_merge_in_order() {
		let secrets = MapSecretStore::default().with("/backplate/slack/token", "xoxb-secret");
		let settings = resolve(SETTINGS, "local", &env(&[]), &secrets).await.unwrap();

		assert_eq!(settings.env(), "local");
		assert_eq!(settings.get_str("project_name").unwrap(), "backplate");
		assert_eq!(settings.get_str("slack.channel_id").unwrap(), "C-LOCAL");
		assert_eq!(settings.get_int("slack.retry_count").unwrap(), 3);
		assert_eq!(settings.get_str("slack.api_token").unwrap(), "xoxb-secret");
		assert!(!settings.get_bool("slack.enabled").unwrap());
		// Placeholder without a value is dropped
		assert!(settings.try_get("missing").is_none());
		assert!(settings.try_get("database_url").is_none());
	}

	#[tokio::test]
	async fn test_other_environments_ignored() {
		let settings = resolve(SETTINGS, "prd", &env(&[]), &NoSecretStore).await.unwrap();
		assert_eq!(settings.get_str("project_name").unwrap(), "production");
		assert_eq!(settings.get_str("slack.channel_id").unwrap(), "C-DEFAULT");
	}

	#[tokio::test]
	async fn test_env_overrides() {
		let vars = env(&[
			("PROJECT_NAME", "from-env"),
			("SLACK_RETRY_COUNT", "5"),
			("SLACK_ENABLED", "True"),
			("AUTH_LEEWAY_SECONDS", "2.5"),
			("DATABASE_URL", "sqlite::memory:"),
		]);
		let settings = resolve(SETTINGS, "local", &vars, &NoSecretStore).await.unwrap();

		assert_eq!(settings.get_str("project_name").unwrap(), "from-env");
		assert_eq!(settings.get("slack.retry_count").unwrap(), &SettingValue::Int(5));
		assert!(settings.get_bool("slack.enabled").unwrap());
		assert_eq!(settings.get("auth.leeway_seconds").unwrap(), &SettingValue::Float(2.5));
		assert_eq!(settings.get_str("database_url").unwrap(), "sqlite::memory:");
	}

	#[tokio::test]
	async fn test_top_level_env_overrides_keep_declared_type() {
		let content = "[default]\nworkers = 4\ndebug = false\n[default.slack]\nretry_count = 3\n";
		let vars = env(&[("WORKERS", "8"), ("DEBUG", "true"), ("SLACK_RETRY_COUNT", "5")]);
		let settings = resolve(content, "local", &vars, &NoSecretStore).await.unwrap();

		assert_eq!(settings.get("workers").unwrap(), &SettingValue::Int(8));
		assert_eq!(settings.get("debug").unwrap(), &SettingValue::Bool(true));
		assert_eq!(settings.get("slack.retry_count").unwrap(), &SettingValue::Int(5));
		assert_eq!(settings.get_int("workers").unwrap(), 8);
		assert!(settings.get_bool("debug").unwrap());
	}

	#[tokio::test]
	async fn test_env_override_with_wrong_type_fails() {
		let vars = env(&[("AUTH_LEEWAY_SECONDS", "not-a-number")]);
		let res = resolve(SETTINGS, "local", &vars, &NoSecretStore).await;
		assert!(matches!(res, Err(Error::ConfigError(_))));

		let res = resolve("[default]\nworkers = 4\n", "local", &env(&[("WORKERS", "many")]), &NoSecretStore).await;
		assert!(matches!(res, Err(Error::ConfigError(_))));
	}

	#[tokio::test]
	async fn test_env_var_does_not_replace_table() {
		let settings = resolve(SETTINGS, "local", &env(&[("SLACK", "off")]), &NoSecretStore).await.unwrap();
		assert_eq!(settings.get_str("slack.channel_id").unwrap(), "C-LOCAL");
	}

	#[tokio::test]
	async fn test_placeholder_substituted_from_env() {
		let settings = resolve(SETTINGS, "local", &env(&[("POOL", "eu-west-1_abc")]), &NoSecretStore)
			.await
			.unwrap();
		assert_eq!(settings.get_str("auth.cognito_user_pool_id").unwrap(), "eu-west-1_abc");

		let settings = resolve(SETTINGS, "local", &env(&[]), &NoSecretStore).await.unwrap();
		assert!(settings.try_get("auth.cognito_user_pool_id").is_none());
	}

	#[tokio::test]
	async fn test_secret_failure_is_not_fatal() {
		let settings = resolve(SETTINGS, "local", &env(&[]), &NoSecretStore).await.unwrap();
		assert!(settings.try_get("slack.api_token").is_none());
		assert_eq!(settings.get_str("slack.channel_id").unwrap(), "C-LOCAL");
	}

	#[tokio::test]
	async fn test_missing_default_section() {
		let res = resolve("[local]\nx = 1\n", "local", &env(&[]), &NoSecretStore).await;
		assert!(matches!(res, Err(Error::ConfigError(_))));
	}

	#[tokio::test]
	async fn test_missing_file() {
		let dir = tempfile::TempDir::new().unwrap();
		let res = load(dir.path().join("nope.toml"), "local", &env(&[]), &NoSecretStore).await;
		assert!(matches!(res, Err(Error::ConfigError(_))));

		let path = dir.path().join("settings.toml");
		std::fs::write(&path, SETTINGS).unwrap();
		let settings = load(&path, "local", &env(&[]), &NoSecretStore).await.unwrap();
		assert_eq!(settings.get_str("api_v1_str").unwrap(), "/api/v1");
	}

	#[test]
	fn test_project_env_default() {
		assert_eq!(project_env(&env(&[])), "local");
		assert_eq!(project_env(&env(&[("PROJECT_ENV", "dev")])), "dev");
	}
}

// vim: ts=4
