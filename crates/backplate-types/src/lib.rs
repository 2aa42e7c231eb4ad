//! Shared types, adapter traits, and error taxonomy for Backplate.
//!
//! Everything the storage adapters and the HTTP layer have to agree on lives
//! here, so adapter crates do not depend on the server crates.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod error;
pub mod prelude;
pub mod store_adapter;
pub mod types;
pub mod user;
pub mod utils;

// vim: ts=4
