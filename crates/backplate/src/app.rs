//! App builder - constructs and runs the Backplate API server

use std::sync::Arc;

use crate::alert::{AlertDispatcher, MessagingClient};
use crate::auth::{CredentialVerifier, KeyRing};
use crate::prelude::*;
use crate::routes;
use crate::settings::AppConfig;
use crate::store_adapter::UserAdapter;
pub use backplate_core::app::{App, AppState, VERSION};
use backplate_core::request::Request;

pub struct AppBuilder {
	config: AppConfig,
	users: Option<Arc<dyn UserAdapter>>,
	keys: Option<Arc<KeyRing>>,
	messaging: Option<Arc<dyn MessagingClient>>,
}

impl AppBuilder {
	pub fn new(config: AppConfig) -> Self {
		AppBuilder { config, users: None, keys: None, messaging: None }
	}

	// Opts
	pub fn listen(&mut self, listen: impl Into<String>) -> &mut Self {
		self.config.listen = listen.into();
		self
	}

	// Adapters
	pub fn user_adapter(&mut self, users: Arc<dyn UserAdapter>) -> &mut Self {
		self.users = Some(users);
		self
	}

	/// Use a preloaded key ring instead of fetching the JWKS at startup
	pub fn key_ring(&mut self, keys: Arc<KeyRing>) -> &mut Self {
		self.keys = Some(keys);
		self
	}

	/// Deliver alerts through `client` instead of Slack's web API
	pub fn messaging_client(&mut self, client: Arc<dyn MessagingClient>) -> &mut Self {
		self.messaging = Some(client);
		self
	}

	/// Assemble the shared application state
	pub async fn build(self) -> BpResult<App> {
		let Some(users) = self.users else {
			error!("FATAL: No user adapter configured");
			return Err(Error::Internal("No user adapter configured".to_string()));
		};

		let request = Request::new()?;

		let keys = if let Some(keys) = self.keys {
			keys
		} else {
			let keys = Arc::new(KeyRing::new(self.config.auth.jwks_url()));
			keys.reload(&request).await.inspect_err(|err| {
				error!("FATAL: Cannot load signing keys: {}", err);
			})?;
			keys
		};

		let verifier = CredentialVerifier::new(&self.config, keys);
		let alerts = match self.messaging {
			Some(client) => AlertDispatcher::with_client(&self.config, client),
			None => AlertDispatcher::from_config(&self.config, &request),
		};

		Ok(Arc::new(AppState {
			config: Arc::new(self.config),
			request,
			verifier,
			alerts,
			users,
		}))
	}

	pub async fn run(self) -> BpResult<()> {
		info!("Backplate V{}", VERSION);
		info!("Environment: {}", self.config.env);

		let app = self.build().await?;
		let router = routes::init(app.clone());

		let listener = tokio::net::TcpListener::bind(&app.config.listen).await.map_err(|err| {
			error!("FATAL: Cannot listen on {}: {}", app.config.listen, err);
			Error::Io(err)
		})?;
		info!("Listening on HTTP {}", app.config.listen);

		axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;
		info!("Server stopped");
		Ok(())
	}
}

async fn shutdown_signal() {
	if let Err(err) = tokio::signal::ctrl_c().await {
		warn!("Cannot listen for shutdown signal: {}", err);
		std::future::pending::<()>().await;
	}
	info!("Shutdown signal received");
}

// vim: ts=4
