//! Alert dispatch to a Slack channel with bounded immediate retry

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

use crate::prelude::*;
use crate::request::Request;
use crate::settings::AppConfig;

pub const SLACK_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Slack message attachment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
	pub pretext: String,
	pub mrkdwn_in: Vec<String>,
	pub color: String,
	pub text: String,
}

#[async_trait]
pub trait MessagingClient: Debug + Send + Sync {
	async fn post_message(&self, channel: &str, attachments: &[Attachment]) -> BpResult<()>;
}

// SlackClient //
//*************//
#[derive(Debug, Clone)]
pub struct SlackClient {
	request: Request,
	token: String,
}

#[derive(Serialize)]
struct PostMessage<'a> {
	channel: &'a str,
	attachments: &'a [Attachment],
}

#[derive(Deserialize)]
struct SlackResponse {
	ok: bool,
	#[serde(default)]
	error: Option<String>,
}

impl SlackClient {
	pub fn new(request: Request, token: impl Into<String>) -> Self {
		Self { request, token: token.into() }
	}
}

#[async_trait]
impl MessagingClient for SlackClient {
	async fn post_message(&self, channel: &str, attachments: &[Attachment]) -> BpResult<()> {
		let res: SlackResponse = self
			.request
			.post(SLACK_POST_MESSAGE_URL, Some(&self.token), &PostMessage { channel, attachments })
			.await?;
		if res.ok {
			Ok(())
		} else {
			Err(Error::ServiceUnavailable(format!(
				"slack api error: {}",
				res.error.as_deref().unwrap_or("unknown")
			)))
		}
	}
}

// AlertDispatcher //
//*****************//
#[derive(Debug, Clone)]
pub struct AlertDispatcher {
	enabled: bool,
	env: String,
	project_name: String,
	channel_id: Option<String>,
	retry_count: u32,
	client: Option<Arc<dyn MessagingClient>>,
}

impl AlertDispatcher {
	/// Dispatcher posting through Slack's web API when alerting is enabled
	pub fn from_config(config: &AppConfig, request: &Request) -> Self {
		let client = match (&config.slack.api_token, config.slack.enabled) {
			(Some(token), true) => {
				Some(Arc::new(SlackClient::new(request.clone(), token.clone())) as Arc<dyn MessagingClient>)
			}
			_ => None,
		};
		Self::build(config, client)
	}

	pub fn with_client(config: &AppConfig, client: Arc<dyn MessagingClient>) -> Self {
		Self::build(config, Some(client))
	}

	fn build(config: &AppConfig, client: Option<Arc<dyn MessagingClient>>) -> Self {
		Self {
			enabled: config.slack.enabled,
			env: config.env.clone(),
			project_name: config.project_name.clone(),
			channel_id: config.slack.channel_id.clone(),
			retry_count: config.slack.retry_count.max(1),
			client,
		}
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	pub fn build_attachment(&self, message: &str, app_name: Option<&str>) -> Attachment {
		let app_name = app_name.unwrap_or(&self.project_name);
		Attachment {
			pretext: format!("*Alert from `{}` `{}`*", self.env.to_uppercase(), app_name),
			mrkdwn_in: vec!["text".into(), "pretext".into()],
			color: "danger".into(),
			text: message.to_string(),
		}
	}

	/// Post an alert to the configured channel.
	///
	/// Failed deliveries are retried immediately, up to `retry_count` attempts
	/// in total. The last error is returned once they are exhausted.
	pub async fn send_alert(&self, message: &str, app_name: Option<&str>) -> BpResult<()> {
		if !self.enabled {
			info!("Trying to send message to Slack but it is not enabled.");
			return Ok(());
		}
		let (Some(client), Some(channel)) = (&self.client, &self.channel_id) else {
			return Err(Error::ConfigError("slack alerting is enabled but not configured".into()));
		};

		let attachments = [self.build_attachment(message, app_name)];
		let mut attempt = 0;
		loop {
			attempt += 1;
			match client.post_message(channel, &attachments).await {
				Ok(()) => return Ok(()),
				Err(err) => {
					error!("Error sending slack alert (attempt {}/{}): {}", attempt, self.retry_count, err);
					if attempt >= self.retry_count {
						return Err(match err {
							Error::ServiceUnavailable(_) => err,
							other => Error::ServiceUnavailable(other.to_string()),
						});
					}
				}
			}
		}
	}
}


// vim: ts=4
