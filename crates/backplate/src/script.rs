//! Batch script runner
//!
//! A script gets the resolved configuration and an alert dispatcher. Any
//! error it returns is logged and reported to the alert channel, and the
//! process exits with a failure code.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use async_trait::async_trait;
use clap::Parser;

use crate::alert::AlertDispatcher;
use crate::prelude::*;
use crate::settings::{self, AppConfig, EnvSource, ProcessEnv, SecretStore, Settings, SsmSecretStore};
use backplate_core::request::Request;

#[derive(Parser, Debug)]
#[command(about = "Run a Backplate batch script")]
struct ScriptArgs {
	/// Settings file (TOML)
	#[arg(short, long, value_name = "FILE")]
	config: PathBuf,
	/// Script-specific arguments
	#[arg(trailing_var_arg = true, allow_hyphen_values = true)]
	args: Vec<String>,
}

/// Everything a script may use while it runs
#[derive(Debug)]
pub struct ScriptContext {
	pub settings: Settings,
	pub config: AppConfig,
	pub request: Request,
	pub alerts: AlertDispatcher,
	/// Arguments following the runner's own options
	pub args: Vec<String>,
}

#[async_trait]
pub trait Script: Send + Sync {
	/// Name reported in alerts
	fn name(&self) -> &str;

	async fn run(&self, ctx: &ScriptContext) -> BpResult<()>;
}

/// Parse the process arguments, run `script`, and map the outcome to an exit code
pub async fn run_script<S: Script>(script: S) -> ExitCode {
	let env = ProcessEnv::new();
	let region = env.var("AWS_REGION").unwrap_or_else(|| settings::source::DEFAULT_SSM_REGION.to_string());
	let secrets = SsmSecretStore::new(&region).await;

	match execute(&script, std::env::args_os(), &env, &secrets).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(_) => ExitCode::FAILURE,
	}
}

/// Run `script` with explicit arguments and sources
pub async fn execute<S, I, T>(
	script: &S,
	args: I,
	env: &dyn EnvSource,
	secrets: &dyn SecretStore,
) -> BpResult<()>
where
	S: Script + ?Sized,
	I: IntoIterator<Item = T>,
	T: Into<OsString> + Clone,
{
	let args = match ScriptArgs::try_parse_from(args) {
		Ok(args) => args,
		Err(err) => {
			let _ = err.print();
			return if err.use_stderr() {
				Err(Error::ConfigError(err.to_string()))
			} else {
				// --help / --version
				Ok(())
			};
		}
	};

	let ctx = match prepare(args, env, secrets).await {
		Ok(ctx) => ctx,
		Err(err) => {
			// Logging may not be up yet
			eprintln!("{}: cannot start: {}", script.name(), err);
			return Err(err);
		}
	};

	info!("running script {}", script.name());
	match script.run(&ctx).await {
		Ok(()) => {
			info!("script {} finished", script.name());
			Ok(())
		}
		Err(err) => {
			let msg = format!("Unhandled error in script {}: {}", script.name(), err);
			error!("{}", msg);
			if let Err(alert_err) = ctx.alerts.send_alert(&msg, Some(script.name())).await {
				error!("could not deliver alert: {}", alert_err);
			}
			Err(err)
		}
	}
}

async fn prepare(
	args: ScriptArgs,
	env: &dyn EnvSource,
	secrets: &dyn SecretStore,
) -> BpResult<ScriptContext> {
	let env_name = settings::project_env(env);
	let settings = settings::load(&args.config, &env_name, env, secrets).await?;
	let config = AppConfig::from_settings(&settings)?;
	backplate_core::logging::init_from_config(&config, env)?;

	let request = Request::new()?;
	let alerts = AlertDispatcher::from_config(&config, &request);
	Ok(ScriptContext { settings, config, request, alerts, args: args.args })
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::settings::MapSecretStore;
	use std::collections::HashMap;
	use std::sync::atomic::{AtomicUsize, Ordering};

	const SETTINGS: &str = r#"
[default]
project_name = "backplate"
database_url = "sqlite::memory:"

[default.slack]
enabled = false
"#;

	struct Counting {
		fail: bool,
		runs: AtomicUsize,
	}

	#[async_trait]
	impl Script for Counting {
		fn name(&self) -> &str {
			"counting"
		}

		async fn run(&self, ctx: &ScriptContext) -> BpResult<()> {
			self.runs.fetch_add(1, Ordering::SeqCst);
			assert_eq!(ctx.config.project_name, "backplate");
			if self.fail { Err(Error::Internal("boom".into())) } else { Ok(()) }
		}
	}

	fn write_settings() -> (tempfile::TempDir, String) {
		let dir = tempfile::TempDir::new().unwrap();
		let path = dir.path().join("settings.toml");
		std::fs::write(&path, SETTINGS).unwrap();
		let path = path.to_string_lossy().into_owned();
		(dir, path)
	}

	#[tokio::test]
	async fn test_successful_script() {
		let (_dir, path) = write_settings();
		let script = Counting { fail: false, runs: AtomicUsize::new(0) };
		let env: HashMap<String, String> = HashMap::new();

		execute(&script, ["script", "-c", path.as_str()], &env, &MapSecretStore::default())
			.await
			.unwrap();
		assert_eq!(script.runs.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn test_failing_script() {
		let (_dir, path) = write_settings();
		let script = Counting { fail: true, runs: AtomicUsize::new(0) };
		let env: HashMap<String, String> = HashMap::new();

		let res =
			execute(&script, ["script", "--config", path.as_str()], &env, &MapSecretStore::default()).await;
		assert!(matches!(res, Err(Error::Internal(_))));
		assert_eq!(script.runs.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn test_missing_config() {
		let script = Counting { fail: false, runs: AtomicUsize::new(0) };
		let env: HashMap<String, String> = HashMap::new();

		let res = execute(&script, ["script"], &env, &MapSecretStore::default()).await;
		assert!(matches!(res, Err(Error::ConfigError(_))));

		let res = execute(
			&script,
			["script", "-c", "/nonexistent/settings.toml"],
			&env,
			&MapSecretStore::default(),
		)
		.await;
		assert!(matches!(res, Err(Error::ConfigError(_))));
		assert_eq!(script.runs.load(Ordering::SeqCst), 0);
	}

	#[test]
	fn test_trailing_args() {
		let args = ScriptArgs::try_parse_from(["script", "-c", "x.toml", "backfill", "--dry-run"]).unwrap();
		assert_eq!(args.config, PathBuf::from("x.toml"));
		assert_eq!(args.args, vec!["backfill".to_string(), "--dry-run".to_string()]);
	}
}

// vim: ts=4
