//! App state type

use std::sync::Arc;

use backplate_types::store_adapter::UserAdapter;

use crate::alert::AlertDispatcher;
use crate::auth::CredentialVerifier;
use crate::request::Request;
use crate::settings::AppConfig;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug)]
pub struct AppState {
	pub config: Arc<AppConfig>,
	pub request: Request,
	pub verifier: CredentialVerifier,
	pub alerts: AlertDispatcher,

	pub users: Arc<dyn UserAdapter>,
}

pub type App = Arc<AppState>;

// vim: ts=4
