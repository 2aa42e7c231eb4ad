//! Custom middlewares

use axum::{
	body::Body,
	extract::State,
	http::{Request, header, response::Response},
	middleware::Next,
};

use crate::auth::VerifiedCredential;
use crate::extract::Auth;
use crate::prelude::*;

fn bypass_sub(query: Option<&str>) -> Option<String> {
	let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query?).ok()?;
	pairs.into_iter().find(|(k, _)| k == "sub").map(|(_, v)| v)
}

fn authenticate(app: &App, req: &Request<Body>) -> BpResult<VerifiedCredential> {
	if app.verifier.local_bypass_enabled() {
		if let Some(credential) =
			bypass_sub(req.uri().query()).and_then(|sub| app.verifier.bypass(&sub))
		{
			return Ok(credential);
		}
	}
	let auth_header = req.headers().get(header::AUTHORIZATION).and_then(|h| h.to_str().ok());
	app.verifier.verify_header(auth_header)
}

pub async fn require_auth(
	State(app): State<App>,
	mut req: Request<Body>,
	next: Next,
) -> BpResult<Response<Body>> {
	let credential = authenticate(&app, &req).inspect_err(|err| debug!("auth rejected: {}", err))?;
	req.extensions_mut().insert(Auth(credential));

	Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_bypass_sub() {
		assert_eq!(bypass_sub(Some("sub=abc&x=1")), Some("abc".to_string()));
		assert_eq!(bypass_sub(Some("x=1")), None);
		assert_eq!(bypass_sub(None), None);
	}
}

// vim: ts=4
