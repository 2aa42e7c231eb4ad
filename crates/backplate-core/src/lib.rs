//! Core infrastructure for Backplate.
//!
//! Settings resolution, logging, outbound HTTP, alerting, bearer token
//! verification, and the request extractors shared by the route handlers.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod alert;
pub mod app;
pub mod auth;
pub mod extract;
pub mod logging;
pub mod middleware;
pub mod prelude;
pub mod request;
pub mod settings;

// Re-export commonly used types
pub use app::{App, AppState};
pub use extract::{ActiveUser, Auth, CurrentUser, Superuser};
pub use settings::AppConfig;

// vim: ts=4
