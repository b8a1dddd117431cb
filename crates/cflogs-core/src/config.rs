//! Configuration types for cflogs.
//!
//! [`Config::load`] layers the built-in defaults, an optional TOML file and
//! the process environment, then validates the result. The store table has no
//! default and must come from `DYNAMODB_TABLE` or the file.
//! [`Config::defaults`] returns the built-in defaults without reading
//! anything (useful in tests).

use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[store]
table              = ""
endpoint           = "http://127.0.0.1:8000"
request_timeout_ms = 5000

[processing]
retention_days = 90
concurrency    = 1
"#;

/// Environment variables and the config keys they override.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("DYNAMODB_TABLE", "store.table"),
    ("CFLOGS_ENDPOINT", "store.endpoint"),
    ("CFLOGS_REQUEST_TIMEOUT_MS", "store.request_timeout_ms"),
    ("CFLOGS_RETENTION_DAYS", "processing.retention_days"),
    ("CFLOGS_CONCURRENCY", "processing.concurrency"),
];

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
}

/// `[store]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub table: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_endpoint() -> String { "http://127.0.0.1:8000".to_string() }
fn default_request_timeout_ms() -> u64 { 5000 }

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table: String::new(),
            endpoint: default_endpoint(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl StoreConfig {
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.request_timeout_ms)
    }
}

/// `[processing]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingConfig {
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_retention_days() -> u32 { crate::normalizer::DEFAULT_RETENTION_DAYS }
fn default_concurrency() -> usize { 1 }

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            concurrency: default_concurrency(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load from the defaults, `file` (if given) and the process environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(file, std::env::vars())
    }

    /// Like [`Config::load`] with an explicit environment.
    pub fn load_from<I>(file: Option<&Path>, env: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml));

        if let Some(path) = file {
            if !path.exists() {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("config file {} not found", path.display()),
                )
                .into());
            }
            builder = builder.add_source(config::File::from(path).format(config::FileFormat::Toml));
        }

        for (name, value) in env {
            if let Some((_, key)) = ENV_OVERRIDES.iter().find(|(var, _)| *var == name) {
                builder = builder.set_override(*key, value)?;
            }
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Return the built-in defaults without touching the filesystem. The
    /// table is empty and must be set before use.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.table.trim().is_empty() {
            return Err(ConfigError::MissingTable);
        }
        if self.processing.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
