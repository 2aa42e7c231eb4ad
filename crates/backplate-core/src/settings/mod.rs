//! Layered settings: TOML file, environment overrides, secret store

pub mod config;
pub mod load;
pub mod source;
pub mod value;

pub use config::{AppConfig, AuthConfig, LoggingConfig, SlackConfig};
pub use load::{load, load_from_process_env, project_env, resolve};
pub use source::{EnvSource, MapSecretStore, NoSecretStore, ProcessEnv, SecretStore, SsmSecretStore};
pub use value::{SettingValue, Settings};

// vim: ts=4
