//! Logging setup on top of `tracing-subscriber`

use std::collections::BTreeMap;

use tracing_subscriber::EnvFilter;

use crate::prelude::*;
use crate::settings::{AppConfig, EnvSource};

pub const ROOT_LOG_LEVEL_VAR: &str = "ROOT_LOG_LEVEL";

/// Accepted level names
pub const LEVELS: [&str; 6] = ["TRACE", "DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

/// Targets pinned regardless of the root level
const QUIET_TARGETS: [(&str, &str); 2] = [("aws_config", "info"), ("aws_smithy_runtime", "info")];

/// Map a level name onto a `tracing` filter level
pub fn parse_level(level: &str) -> Option<&'static str> {
	match level.trim().to_ascii_uppercase().as_str() {
		"TRACE" => Some("trace"),
		"DEBUG" => Some("debug"),
		"INFO" => Some("info"),
		"WARNING" | "WARN" => Some("warn"),
		"ERROR" | "CRITICAL" => Some("error"),
		_ => None,
	}
}

/// Root level used when none is configured
pub fn default_level(env: &str) -> &'static str {
	if matches!(env, "local" | "dev") { "debug" } else { "info" }
}

/// Build `EnvFilter` directives from a root level and per-target levels.
///
/// Target names may use dotted module paths (`backplate_core.alert`).
pub fn build_directives(
	env: &str,
	root_level: Option<&str>,
	targets: &BTreeMap<String, String>,
) -> BpResult<String> {
	let root = match root_level {
		Some(level) => parse_level(level)
			.ok_or_else(|| Error::ConfigError(format!("invalid root log level: {}", level)))?,
		None => default_level(env),
	};

	let mut directives = vec![root.to_string()];
	for (target, level) in QUIET_TARGETS {
		if !targets.contains_key(target) {
			directives.push(format!("{}={}", target, level));
		}
	}
	for (target, level) in targets {
		let parsed = parse_level(level).ok_or_else(|| {
			Error::ConfigError(format!("invalid log level for module {}: {}", target, level))
		})?;
		directives.push(format!("{}={}", target.replace('.', "::"), parsed));
	}
	Ok(directives.join(","))
}

/// Install the global subscriber. Repeated calls are no-ops.
pub fn init_logging(
	env: &str,
	root_level: Option<&str>,
	targets: &BTreeMap<String, String>,
) -> BpResult<()> {
	let directives = build_directives(env, root_level, targets)?;
	let filter = EnvFilter::try_new(&directives)
		.map_err(|err| Error::ConfigError(format!("invalid log filter '{}': {}", directives, err)))?;

	if tracing_subscriber::fmt().with_env_filter(filter).with_target(true).try_init().is_err() {
		debug!("logging already initialized");
	}
	Ok(())
}

/// Initialize logging from configuration; `ROOT_LOG_LEVEL` wins over the file
pub fn init_from_config(config: &AppConfig, env: &dyn EnvSource) -> BpResult<()> {
	let root_level = env.var(ROOT_LOG_LEVEL_VAR).or_else(|| config.logging.root_level.clone());
	init_logging(&config.env, root_level.as_deref(), &config.logging.targets)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_levels() {
		for level in LEVELS {
			assert!(parse_level(level).is_some(), "{}", level);
		}
		assert_eq!(parse_level("warning"), Some("warn"));
		assert_eq!(parse_level("CRITICAL"), Some("error"));
		assert_eq!(parse_level("LOUD"), None);
	}

	#[test]
	fn test_directives() {
		let mut targets = BTreeMap::new();
		targets.insert("backplate_core.alert".to_string(), "ERROR".to_string());

		let directives = build_directives("local", None, &targets).unwrap();
		assert!(directives.starts_with("debug,"));
		assert!(directives.contains("backplate_core::alert=error"));

		let directives = build_directives("prd", None, &BTreeMap::new()).unwrap();
		assert!(directives.starts_with("info,"));

		let directives = build_directives("prd", Some("WARNING"), &BTreeMap::new()).unwrap();
		assert!(directives.starts_with("warn,"));
	}

	#[test]
	fn test_invalid_levels() {
		assert!(matches!(
			build_directives("local", Some("NOISY"), &BTreeMap::new()),
			Err(Error::ConfigError(_))
		));

		let mut targets = BTreeMap::new();
		targets.insert("sqlx".to_string(), "NOISY".to_string());
		assert!(matches!(build_directives("local", None, &targets), Err(Error::ConfigError(_))));
	}

	#[test]
	fn test_init_is_idempotent() {
		assert!(init_logging("local", None, &BTreeMap::new()).is_ok());
		assert!(init_logging("local", Some("INFO"), &BTreeMap::new()).is_ok());
	}
}

// vim: ts=4
