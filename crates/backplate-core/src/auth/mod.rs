//! Bearer token authentication against identity provider keys

pub mod jwks;
pub mod verifier;

pub use jwks::KeyRing;
pub use verifier::{CredentialVerifier, VerifiedCredential};

// vim: ts=4
