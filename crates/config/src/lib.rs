//! Configuration management for the receptionist
//!
//! Supports loading configuration from:
//! - YAML/TOML/JSON files under `config/`
//! - Environment variables (RECEPTIONIST__ prefix)
//!
//! The response catalog is either the built-in set of templates or a
//! file named by `responses.catalog_path`.

pub mod agent;
pub mod constants;
pub mod prompts;
pub mod settings;

pub use agent::{DialogueConfig, PersonaConfig};
pub use prompts::{ResponseCatalog, ResponseCategory, ResponseTemplate, KNOWN_PLACEHOLDERS};
pub use settings::{
    load_settings, load_settings_from, ObservabilityConfig, ResponsesConfig, RuntimeEnvironment,
    ServerConfig, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Invalid response catalog: {0}")]
    InvalidCatalog(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
