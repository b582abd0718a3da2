//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{dialogue, server};
use crate::prompts::ResponseCatalog;
use crate::{ConfigError, DialogueConfig, PersonaConfig};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Call runtime configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Dialogue controller tuning
    #[serde(default)]
    pub dialogue: DialogueConfig,

    /// Agent persona
    #[serde(default)]
    pub persona: PersonaConfig,

    /// Response catalog source
    #[serde(default)]
    pub responses: ResponsesConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_dialogue()?;
        self.validate_server()?;
        Ok(())
    }

    fn validate_dialogue(&self) -> Result<(), ConfigError> {
        let d = &self.dialogue;

        if d.max_clarification_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dialogue.max_clarification_attempts".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if d.max_clarification_attempts > dialogue::MAX_CLARIFICATION_ATTEMPTS_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: "dialogue.max_clarification_attempts".to_string(),
                message: format!(
                    "Must be at most {}, got {}",
                    dialogue::MAX_CLARIFICATION_ATTEMPTS_LIMIT,
                    d.max_clarification_attempts
                ),
            });
        }

        if d.recent_response_window == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dialogue.recent_response_window".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&d.low_confidence_threshold) {
            return Err(ConfigError::InvalidValue {
                field: "dialogue.low_confidence_threshold".to_string(),
                message: format!(
                    "Must be between 0.0 and 1.0, got {}",
                    d.low_confidence_threshold
                ),
            });
        }

        if d.classifier_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "dialogue.classifier_timeout_ms".to_string(),
                message: "Must be greater than 0 when set".to_string(),
            });
        }

        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let s = &self.server;

        if s.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if s.max_calls == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_calls".to_string(),
                message: "Must allow at least one call".to_string(),
            });
        }

        if s.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if s.cleanup_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.cleanup_interval_secs".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if s.idle_timeout_secs < s.cleanup_interval_secs {
            tracing::warn!(
                idle_timeout_secs = s.idle_timeout_secs,
                cleanup_interval_secs = s.cleanup_interval_secs,
                "Idle timeout shorter than cleanup interval; idle calls are swept late"
            );
        }

        if self.environment.is_production() && s.cors_enabled && s.cors_origins.is_empty() {
            tracing::warn!("CORS enabled with no origins in production; all origins allowed");
        }

        Ok(())
    }
}

/// Call runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum concurrent calls
    #[serde(default = "default_max_calls")]
    pub max_calls: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Calls idle for longer than this are resolved as abandoned
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Idle-call sweep period
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins (empty = any)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    server::HOST.to_string()
}
fn default_port() -> u16 {
    server::PORT
}
fn default_max_calls() -> usize {
    server::MAX_CALLS
}
fn default_timeout() -> u64 {
    server::REQUEST_TIMEOUT_SECS
}
fn default_idle_timeout() -> u64 {
    server::IDLE_TIMEOUT_SECS
}
fn default_cleanup_interval() -> u64 {
    server::CLEANUP_INTERVAL_SECS
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_calls: default_max_calls(),
            timeout_seconds: default_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            cleanup_interval_secs: default_cleanup_interval(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

/// Where response templates come from
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResponsesConfig {
    /// Catalog file (.yaml, .yml, .toml or .json); built-in catalog when unset
    #[serde(default)]
    pub catalog_path: Option<String>,
}

impl ResponsesConfig {
    /// Load and validate the configured catalog
    pub fn load_catalog(&self) -> Result<ResponseCatalog, ConfigError> {
        let catalog = match &self.catalog_path {
            Some(path) => ResponseCatalog::load(path)?,
            None => ResponseCatalog::default(),
        };
        catalog.validate()?;
        Ok(catalog)
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Install the Prometheus recorder and expose /metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from `config/` relative to the working directory
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from("config", env)
}

/// Load settings from a config directory
///
/// Sources, later overriding earlier:
/// 1. `<dir>/default.*`
/// 2. `<dir>/<env>.*`
/// 3. `RECEPTIONIST__SECTION__FIELD` environment variables
pub fn load_settings_from(
    config_dir: impl AsRef<Path>,
    env: Option<&str>,
) -> Result<Settings, ConfigError> {
    let config_dir = config_dir.as_ref();
    let mut builder = Config::builder();

    // Load default config
    let default_path = config_dir.join("default");
    builder = builder.add_source(File::with_name(&default_path.to_string_lossy()).required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        let env_path = config_dir.join(env_name);
        builder = builder.add_source(File::with_name(&env_path.to_string_lossy()).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("RECEPTIONIST")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
