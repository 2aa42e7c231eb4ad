//! Bearer credential verification against the key ring

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use backplate_types::utils::{decode_jwt_segment, split_jwt};

use super::jwks::KeyRing;
use crate::prelude::*;
use crate::settings::AppConfig;

pub const BEARER_SCHEME: &str = "Bearer";

/// A bearer token whose signature has been checked
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedCredential {
	pub token: String,
	pub header: Map<String, Value>,
	pub claims: Map<String, Value>,
	pub signature: String,
	/// `header.payload`, the signed part of the token
	pub message: String,
}

impl VerifiedCredential {
	pub fn sub(&self) -> Option<&str> {
		self.claims.get("sub").and_then(Value::as_str)
	}

	/// Credential standing in for a real token during local development
	fn local(sub: &str) -> Self {
		let mut claims = Map::new();
		claims.insert("sub".into(), Value::String(sub.to_string()));
		Self {
			token: String::new(),
			header: Map::new(),
			claims,
			signature: String::new(),
			message: String::new(),
		}
	}
}

#[derive(Debug)]
pub struct CredentialVerifier {
	keys: Arc<KeyRing>,
	leeway_seconds: u64,
	audience: Option<String>,
	local_bypass: bool,
}

impl CredentialVerifier {
	pub fn new(config: &AppConfig, keys: Arc<KeyRing>) -> Self {
		let local_bypass = config.local_bypass_enabled();
		if local_bypass {
			warn!("local authentication bypass is active: '?sub=' is accepted in place of a token");
		}
		Self {
			keys,
			leeway_seconds: config.auth.leeway_seconds,
			audience: config.auth.audience.clone(),
			local_bypass,
		}
	}

	pub fn keys(&self) -> &Arc<KeyRing> {
		&self.keys
	}

	pub fn local_bypass_enabled(&self) -> bool {
		self.local_bypass
	}

	/// Credential for a `?sub=` query parameter, when the bypass is active
	pub fn bypass(&self, sub: &str) -> Option<VerifiedCredential> {
		if self.local_bypass && !sub.is_empty() {
			debug!("local bypass for sub {}", sub);
			Some(VerifiedCredential::local(sub))
		} else {
			None
		}
	}

	/// Verify an `Authorization` header value
	pub fn verify_header(&self, header: Option<&str>) -> BpResult<VerifiedCredential> {
		let header =
			header.ok_or_else(|| Error::Unauthorized("Not authenticated".into()))?;
		let (scheme, token) = header
			.split_once(' ')
			.ok_or_else(|| Error::Unauthorized("Not authenticated".into()))?;
		if scheme != BEARER_SCHEME {
			return Err(Error::Unauthorized("Wrong authentication method".into()));
		}
		let token = token.trim();
		if token.is_empty() {
			return Err(Error::Unauthorized("Not authenticated".into()));
		}
		self.verify_token(token)
	}

	/// Verify a compact JWT: parse, look up the signing key, check the
	/// signature, then validate expiry
	pub fn verify_token(&self, token: &str) -> BpResult<VerifiedCredential> {
		let parts = split_jwt(token)?;
		let header_map: Map<String, Value> = decode_jwt_segment(parts.header)?;
		let header = jsonwebtoken::decode_header(token)
			.map_err(|err| Error::Unauthorized(format!("invalid token header: {}", err)))?;

		let kid = header
			.kid
			.as_deref()
			.ok_or_else(|| Error::Unauthorized("token has no key id".into()))?;
		let jwk = self
			.keys
			.get(kid)
			.ok_or_else(|| Error::Unauthorized("JWK public key not found".into()))?;
		let key = DecodingKey::from_jwk(&jwk)
			.map_err(|err| Error::Unauthorized(format!("unusable JWK {}: {}", kid, err)))?;

		// A key that names its algorithm only accepts tokens signed with it
		let alg = match jwk.common.key_algorithm {
			Some(key_alg) => {
				let alg = key_alg.to_string().parse::<Algorithm>().map_err(|_| {
					Error::Unauthorized(format!("JWK {} is not a signing key: {}", kid, key_alg))
				})?;
				if alg != header.alg {
					debug!("token rejected: header alg {:?} but key {} is {:?}", header.alg, kid, alg);
					return Err(Error::Unauthorized("token algorithm does not match key".into()));
				}
				alg
			}
			None => header.alg,
		};

		let mut validation = Validation::new(alg);
		validation.leeway = self.leeway_seconds;
		match &self.audience {
			Some(aud) => validation.set_audience(&[aud]),
			None => validation.validate_aud = false,
		}

		let data = jsonwebtoken::decode::<Map<String, Value>>(token, &key, &validation)
			.map_err(|err| {
				debug!("token rejected: {}", err);
				Error::Unauthorized(format!("Could not validate credentials: {}", err))
			})?;

		Ok(VerifiedCredential {
			token: token.to_string(),
			header: header_map,
			claims: data.claims,
			signature: parts.signature.to_string(),
			message: parts.message.to_string(),
		})
	}
}


// vim: ts=4
