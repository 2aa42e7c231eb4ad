//! Request client implementation

use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;

use crate::prelude::*;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct Request(reqwest::Client);

impl Request {
	pub fn new() -> BpResult<Self> {
		let client = reqwest::Client::builder()
			.timeout(REQUEST_TIMEOUT)
			.user_agent(concat!("backplate/", env!("CARGO_PKG_VERSION")))
			.build()
			.map_err(|err| Error::Internal(format!("http client: {}", err)))?;
		Ok(Request(client))
	}

	pub async fn get<Res>(&self, url: &str) -> BpResult<Res>
	where
		Res: DeserializeOwned,
	{
		let res = self.0.get(url).send().await.map_err(|err| {
			warn!("GET {} failed: {}", url, err);
			Error::ServiceUnavailable(format!("request to {} failed", url))
		})?;
		Self::parse(url, res).await
	}

	pub async fn post<Res>(
		&self,
		url: &str,
		bearer: Option<&str>,
		data: &impl Serialize,
	) -> BpResult<Res>
	where
		Res: DeserializeOwned,
	{
		let mut req = self.0.post(url).json(data);
		if let Some(token) = bearer {
			req = req.bearer_auth(token);
		}
		let res = req.send().await.map_err(|err| {
			warn!("POST {} failed: {}", url, err);
			Error::ServiceUnavailable(format!("request to {} failed", url))
		})?;
		Self::parse(url, res).await
	}

	async fn parse<Res>(url: &str, res: reqwest::Response) -> BpResult<Res>
	where
		Res: DeserializeOwned,
	{
		let status = res.status();
		if !status.is_success() {
			return Err(Error::ServiceUnavailable(format!("{} responded with {}", url, status)));
		}
		res.json().await.map_err(|err| {
			error!("Failed to deserialize response from {}: {}", url, err);
			Error::ServiceUnavailable(format!("invalid response from {}", url))
		})
	}
}

// vim: ts=4
