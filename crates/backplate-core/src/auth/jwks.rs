//! Key ring of JSON Web Keys published by the identity provider

use jsonwebtoken::jwk::Jwk;
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;

use crate::prelude::*;
use crate::request::Request;

#[derive(Deserialize)]
struct RawJwkSet {
	keys: Vec<serde_json::Value>,
}

/// Keys indexed by key id (`kid`)
#[derive(Debug, Default)]
pub struct KeyRing {
	url: Option<String>,
	keys: RwLock<HashMap<String, Jwk>>,
}

impl KeyRing {
	pub fn new(url: Option<String>) -> Self {
		Self { url, keys: RwLock::new(HashMap::new()) }
	}

	/// Key ring holding the given keys; keys without a `kid` are skipped
	pub fn from_keys(keys: impl IntoIterator<Item = Jwk>) -> Self {
		let ring = Self::new(None);
		for key in keys {
			if let Err(err) = ring.insert(key) {
				warn!("skipping key: {}", err);
			}
		}
		ring
	}

	pub fn url(&self) -> Option<&str> {
		self.url.as_deref()
	}

	pub fn insert(&self, key: Jwk) -> BpResult<()> {
		let kid = key
			.common
			.key_id
			.clone()
			.ok_or_else(|| Error::ValidationError("JWK has no key id".into()))?;
		self.keys.write().insert(kid, key);
		Ok(())
	}

	pub fn get(&self, kid: &str) -> Option<Jwk> {
		self.keys.read().get(kid).cloned()
	}

	pub fn len(&self) -> usize {
		self.keys.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.keys.read().is_empty()
	}

	/// Parse a JWKS document. Keys that cannot be parsed or carry no `kid` are
	/// skipped with a warning.
	pub fn parse_jwks(json: &serde_json::Value) -> BpResult<HashMap<String, Jwk>> {
		let raw = RawJwkSet::deserialize(json)
			.map_err(|err| Error::ServiceUnavailable(format!("invalid JWKS document: {}", err)))?;
		let mut keys = HashMap::new();
		for value in raw.keys {
			match serde_json::from_value::<Jwk>(value) {
				Ok(key) => match key.common.key_id.clone() {
					Some(kid) => {
						keys.insert(kid, key);
					}
					None => warn!("skipping JWK without key id"),
				},
				Err(err) => warn!("skipping unsupported JWK: {}", err),
			}
		}
		Ok(keys)
	}

	/// Replace the key set with the one currently published at `url`
	pub async fn reload(&self, request: &Request) -> BpResult<usize> {
		let Some(url) = &self.url else {
			warn!("no JWKS URL configured, every bearer token will be rejected");
			return Ok(0);
		};
		let json: serde_json::Value = request.get(url).await?;
		let keys = Self::parse_jwks(&json)?;
		let count = keys.len();
		*self.keys.write() = keys;
		info!("loaded {} signing keys from {}", count, url);
		Ok(count)
	}
}


// vim: ts=4
