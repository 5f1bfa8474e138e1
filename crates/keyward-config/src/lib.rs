//! Configuration system for keyward clients.
//!
//! Provides TOML-based configuration with:
//! - Endpoint paths and transport settings
//! - Login request bodies and response field mappings, turned into client hooks
//! - Config file layering (user config + project-local overrides)

pub mod client;
pub mod discovery;
pub mod error;
pub mod types;

pub use client::{build_client, build_configuration, build_transport};
pub use discovery::{
    ConfigSource, LoadedSettings, load_settings, load_settings_file, load_settings_with_options,
    user_config_dir, user_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
