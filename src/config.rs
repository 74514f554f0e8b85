use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_STORAGE_BACKEND: &str = "file";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_CURRENCY_SYMBOL: &str = "$";

pub const FILE_BACKEND: &str = "file";
pub const IN_MEMORY_BACKEND: &str = "in-memory";

/// Where record lists are persisted
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Storage backend: "file" or "in-memory"
    #[serde(default = "default_storage_backend")]
    #[validate(custom = "validate_storage_backend")]
    pub backend: String,

    /// Directory holding one JSON file per record type (file backend only)
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    pub fn in_memory() -> Self {
        Self {
            backend: IN_MEMORY_BACKEND.to_string(),
            data_dir: String::new(),
        }
    }

    pub fn file(data_dir: impl Into<String>) -> Self {
        Self {
            backend: FILE_BACKEND.to_string(),
            data_dir: data_dir.into(),
        }
    }

    pub fn is_file_backend(&self) -> bool {
        self.backend.eq_ignore_ascii_case(FILE_BACKEND)
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Storage configuration
    #[serde(default)]
    #[validate]
    pub storage: StorageConfig,

    /// Write one sample record per type into slots that have never been written
    #[serde(default = "default_true_bool")]
    pub seed_samples: bool,

    /// Prefix used when printing amounts
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

impl AppConfig {
    /// Creates a new configuration
    pub fn new(environment: String, storage: StorageConfig) -> Self {
        Self {
            environment,
            log_level: default_log_level(),
            log_json: false,
            storage,
            seed_samples: default_true_bool(),
            currency_symbol: default_currency_symbol(),
        }
    }

    /// Checks if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Checks if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Gets storage configuration reference
    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.storage.is_file_backend() && self.storage.data_dir.trim().is_empty() {
            let mut err = ValidationError::new("data_dir_required");
            err.message = Some(
                "The file storage backend needs a data directory. Set APP__STORAGE__DATA_DIR or switch to the in-memory backend.".into(),
            );
            errors.add("storage", err);
        }

        if self.is_production() && !self.storage.is_file_backend() {
            let mut err = ValidationError::new("storage_backend_production");
            err.message =
                Some("Production cannot use the in-memory backend; records would be lost on exit.".into());
            errors.add("storage", err);
        }

        if self.currency_symbol.trim().is_empty() {
            let mut err = ValidationError::new("currency_symbol");
            err.message = Some("currency_symbol must not be blank".into());
            errors.add("currency_symbol", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Default value functions
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_storage_backend() -> String {
    DEFAULT_STORAGE_BACKEND.to_string()
}

fn default_data_dir() -> String {
    DEFAULT_DATA_DIR.to_string()
}

fn default_currency_symbol() -> String {
    DEFAULT_CURRENCY_SYMBOL.to_string()
}

fn default_true_bool() -> bool {
    true
}

fn validate_storage_backend(value: &str) -> Result<(), ValidationError> {
    match value.to_ascii_lowercase().as_str() {
        FILE_BACKEND | IN_MEMORY_BACKEND => Ok(()),
        _ => {
            let mut err = ValidationError::new("storage_backend");
            err.message = Some("Must be one of: file, in-memory".into());
            Err(err)
        }
    }
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("procurement_records={0},procurement_cli={0}", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let builder = fmt()
        .with_env_filter(EnvFilter::new(filter_directive))
        .with_writer(std::io::stderr);

    if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());

    load_config_from(Path::new(CONFIG_DIR), &run_env)
}

/// Loads configuration from an explicit config directory and profile.
pub fn load_config_from(config_dir: &Path, run_env: &str) -> Result<AppConfig, AppConfigError> {
    info!("Loading configuration for environment: {}", run_env);

    if !config_dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir.display()
        );
    }

    let config = Config::builder()
        .set_default("environment", run_env)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(
            File::with_name(&config_dir.join("default").to_string_lossy()).required(false),
        )
        .add_source(File::with_name(&config_dir.join(run_env).to_string_lossy()).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration constraint validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}
