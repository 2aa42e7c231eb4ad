//! Utility functions

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::de::DeserializeOwned;

use crate::prelude::*;

/// Compact JWT split into its encoded segments
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JwtParts<'a> {
	pub header: &'a str,
	pub payload: &'a str,
	pub signature: &'a str,
	/// `header.payload`, the bytes covered by the signature
	pub message: &'a str,
}

pub fn split_jwt(jwt: &str) -> BpResult<JwtParts<'_>> {
	let malformed = || Error::Unauthorized("malformed token".into());
	let (message, signature) = jwt.rsplit_once('.').ok_or_else(malformed)?;
	let (header, payload) = message.split_once('.').ok_or_else(malformed)?;
	if header.is_empty() || payload.is_empty() || payload.contains('.') {
		return Err(malformed());
	}
	Ok(JwtParts { header, payload, signature, message })
}

/// Decode one base64url JWT segment as JSON
pub fn decode_jwt_segment<T: DeserializeOwned>(segment: &str) -> BpResult<T> {
	let bytes = URL_SAFE_NO_PAD
		.decode(segment.as_bytes())
		.map_err(|_| Error::Unauthorized("invalid token encoding".into()))?;
	serde_json::from_slice(&bytes).map_err(|_| Error::Unauthorized("invalid token content".into()))
}

pub fn decode_jwt_no_verify<T: DeserializeOwned>(jwt: &str) -> BpResult<T> {
	let parts = split_jwt(jwt)?;
	decode_jwt_segment(parts.payload)
}

pub fn is_valid_timezone(tz: &str) -> bool {
	tz.parse::<Tz>().is_ok()
}

/// Today's date in the given IANA timezone
pub fn user_local_date(tz: &str) -> BpResult<NaiveDate> {
	let tz: Tz = tz.parse().map_err(|_| Error::ValidationError("Invalid timezone".into()))?;
	Ok(Utc::now().with_timezone(&tz).date_naive())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_split_jwt() {
		let parts = split_jwt("aGVhZA.Ym9keQ.c2ln").unwrap();
		assert_eq!(parts.header, "aGVhZA");
		assert_eq!(parts.payload, "Ym9keQ");
		assert_eq!(parts.signature, "c2ln");
		assert_eq!(parts.message, "aGVhZA.Ym9keQ");

		assert!(split_jwt("no-dots").is_err());
		assert!(split_jwt("one.dot").is_err());
		assert!(split_jwt(".x.y").is_err());
	}

	#[test]
	fn test_split_jwt_rejects_extra_segments() {
		assert!(split_jwt("a.b.c.d").is_err());
		assert!(split_jwt("aGVhZA.Ym9keQ.c2ln.ZXh0cmE").is_err());
		// Empty signature is still three segments
		assert!(split_jwt("a.b.").is_ok());
	}

	#[test]
	fn test_decode_jwt_no_verify() {
		let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"abc"}"#);
		let token = format!("e30.{}.sig", payload);
		let claims: serde_json::Value = decode_jwt_no_verify(&token).unwrap();
		assert_eq!(claims["sub"], "abc");

		assert!(decode_jwt_no_verify::<serde_json::Value>("e30.!!!.sig").is_err());
	}

	#[test]
	fn test_timezones() {
		assert!(is_valid_timezone("Europe/Budapest"));
		assert!(is_valid_timezone("UTC"));
		assert!(!is_valid_timezone("Nowhere/Special"));

		let utc = user_local_date("UTC").unwrap();
		assert!((utc - Utc::now().date_naive()).num_days().abs() <= 1);
		assert!(user_local_date("bogus").is_err());
	}
}

// vim: ts=4
