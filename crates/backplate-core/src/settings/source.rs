//! Environment and secret-store sources consulted while resolving settings

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;

use crate::prelude::*;

pub const DEFAULT_SSM_REGION: &str = "us-east-1";

// EnvSource //
//***********//
pub trait EnvSource: Send + Sync {
	fn var(&self, name: &str) -> Option<String>;
}

/// Process environment, after loading a `.env` file if one is found
#[derive(Debug, Clone, Copy)]
pub struct ProcessEnv;

impl ProcessEnv {
	pub fn new() -> Self {
		match dotenvy::dotenv() {
			Ok(path) => debug!("loaded environment from {}", path.display()),
			Err(err) if err.not_found() => {}
			Err(err) => warn!("failed to load .env file: {}", err),
		}
		ProcessEnv
	}
}

impl Default for ProcessEnv {
	fn default() -> Self {
		Self::new()
	}
}

impl EnvSource for ProcessEnv {
	fn var(&self, name: &str) -> Option<String> {
		std::env::var(name).ok()
	}
}

impl EnvSource for HashMap<String, String> {
	fn var(&self, name: &str) -> Option<String> {
		self.get(name).cloned()
	}
}

// SecretStore //
//*************//
#[async_trait]
pub trait SecretStore: Debug + Send + Sync {
	/// Fetch a decrypted parameter by path. `Ok(None)` if the store has no value.
	async fn get_parameter(&self, path: &str) -> BpResult<Option<String>>;
}

/// Store used when no secret backend is configured; every fetch fails
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSecretStore;

#[async_trait]
impl SecretStore for NoSecretStore {
	async fn get_parameter(&self, path: &str) -> BpResult<Option<String>> {
		Err(Error::ServiceUnavailable(format!("no secret store configured for '{}'", path)))
	}
}

/// In-memory parameters
#[derive(Debug, Clone, Default)]
pub struct MapSecretStore(pub HashMap<String, String>);

impl MapSecretStore {
	pub fn with(mut self, path: impl Into<String>, value: impl Into<String>) -> Self {
		self.0.insert(path.into(), value.into());
		self
	}
}

#[async_trait]
impl SecretStore for MapSecretStore {
	async fn get_parameter(&self, path: &str) -> BpResult<Option<String>> {
		Ok(self.0.get(path).cloned())
	}
}

/// AWS SSM Parameter Store
#[derive(Debug, Clone)]
pub struct SsmSecretStore {
	client: aws_sdk_ssm::Client,
}

impl SsmSecretStore {
	/// Build a client from the default AWS credential chain. Credentials are
	/// resolved lazily, on the first fetch.
	pub async fn new(region: &str) -> Self {
		let shared_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
			.region(aws_config::Region::new(region.to_string()))
			.load()
			.await;
		Self { client: aws_sdk_ssm::Client::new(&shared_config) }
	}
}

#[async_trait]
impl SecretStore for SsmSecretStore {
	async fn get_parameter(&self, path: &str) -> BpResult<Option<String>> {
		let res = self
			.client
			.get_parameter()
			.name(path)
			.with_decryption(true)
			.send()
			.await
			.map_err(|err| {
				Error::ServiceUnavailable(format!(
					"ssm parameter '{}': {}",
					path,
					aws_sdk_ssm::error::DisplayErrorContext(&err)
				))
			})?;
		Ok(res.parameter().and_then(|p| p.value()).map(str::to_string))
	}
}

// vim: ts=4
