use axum::{
	Router,
	http::{HeaderValue, header},
	middleware,
	routing::get,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::prelude::*;
use crate::users;
use backplate_core::middleware::require_auth;

fn init_api(app: &App) -> Router<App> {
	Router::new()
		.route("/users/", get(users::handler::list_users).post(users::handler::post_user))
		.route("/users/me", get(users::handler::get_me).patch(users::handler::patch_me))
		.route(
			"/users/{id}",
			get(users::handler::get_user)
				.patch(users::handler::patch_user)
				.delete(users::handler::delete_user),
		)
		.layer(middleware::from_fn_with_state(app.clone(), require_auth))
}

/// CORS for the configured origins; `None` if no origin is allowed
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
	if origins.is_empty() {
		return None;
	}
	if origins.iter().any(|origin| origin == "*") {
		return Some(CorsLayer::permissive());
	}

	let origins: Vec<HeaderValue> = origins
		.iter()
		.filter_map(|origin| {
			HeaderValue::from_str(origin.trim_end_matches('/'))
				.inspect_err(|_| warn!("ignoring invalid CORS origin: {}", origin))
				.ok()
		})
		.collect();

	Some(
		CorsLayer::new()
			.allow_origin(AllowOrigin::list(origins))
			.allow_methods(AllowMethods::mirror_request())
			.allow_headers(AllowHeaders::mirror_request())
			.expose_headers([header::CONTENT_TYPE])
			.allow_credentials(true),
	)
}

pub fn init(app: App) -> Router {
	let api = init_api(&app);
	let prefix = app.config.api_prefix.trim_end_matches('/');

	let mut router = Router::new().route("/health", get(async || "ok"));
	router = if prefix.is_empty() { router.merge(api) } else { router.nest(prefix, api) };

	if let Some(cors) = cors_layer(&app.config.cors_origins) {
		router = router.layer(cors);
	}
	router.layer(TraceLayer::new_for_http()).with_state(app)
}


// vim: ts=4
