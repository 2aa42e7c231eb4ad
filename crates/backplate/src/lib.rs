//! Backplate is a template CRUD backend.
//!
//! # Features
//!
//! - REST API over a versioned, soft-deleting record store
//! - Bearer token authentication against the identity provider's JWKS
//! - Layered settings (TOML file, environment, AWS SSM)
//! - Batch script runner with Slack alerting on failure

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

// Re-export shared types and adapter traits from backplate-types
pub use backplate_types::error;
pub use backplate_types::store_adapter;
pub use backplate_types::types;
pub use backplate_types::user;
pub use backplate_types::utils;

// Core re-exports
pub use backplate_core::alert;
pub use backplate_core::auth;
pub use backplate_core::logging;
pub use backplate_core::settings;

// Local modules
pub mod app;
pub mod prelude;
pub mod routes;
pub mod script;
pub mod users;

pub use crate::app::{App, AppBuilder};

// vim: ts=4
