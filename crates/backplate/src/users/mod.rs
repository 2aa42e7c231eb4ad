//! User REST endpoints

pub mod handler;

// vim: ts=4
