//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `MARGINALIA_*` environment overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::groups::DEFAULT_BLACKLIST_PATH;
use crate::search::DEFAULT_PAGE_SIZE;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub activity: ActivityConfig,

    #[serde(default)]
    pub groups: GroupsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Annotation database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|p| {
            p.join("marginalia")
                .join("marginalia.db")
                .to_string_lossy()
                .to_string()
        })
        .unwrap_or_else(|| "./marginalia_data/marginalia.db".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

impl StorageConfig {
    /// Database location with a leading `~/` expanded
    pub fn database_path(&self) -> PathBuf {
        expand_home(&self.database_path)
    }
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Activity search configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityConfig {
    /// Maximum number of annotations per search page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

/// Group form configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GroupsConfig {
    /// File listing reserved group slugs, one per line
    #[serde(default = "default_blacklist_path")]
    pub blacklist_path: String,
}

fn default_blacklist_path() -> String {
    DEFAULT_BLACKLIST_PATH.to_string()
}

impl Default for GroupsConfig {
    fn default() -> Self {
        Self {
            blacklist_path: default_blacklist_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("marginalia").join("config.toml")),
            Some(PathBuf::from("/etc/marginalia/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Storage overrides
        if let Some(path) = var("MARGINALIA_DATABASE_PATH") {
            self.storage.database_path = path;
        }

        // API overrides
        if let Some(host) = var("MARGINALIA_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("MARGINALIA_API_PORT") {
            match port.parse() {
                Ok(p) => self.api.port = p,
                Err(_) => tracing::warn!("Ignoring invalid MARGINALIA_API_PORT: {}", port),
            }
        }

        // Activity and group overrides
        if let Some(size) = var("MARGINALIA_PAGE_SIZE") {
            match size.parse() {
                Ok(s) => self.activity.page_size = s,
                Err(_) => tracing::warn!("Ignoring invalid MARGINALIA_PAGE_SIZE: {}", size),
            }
        }
        if let Some(path) = var("MARGINALIA_BLACKLIST_PATH") {
            self.groups.blacklist_path = path;
        }

        // Logging overrides
        if let Some(level) = var("MARGINALIA_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("MARGINALIA_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Marginalia Configuration
#
# Environment variables override these settings:
# - MARGINALIA_DATABASE_PATH
# - MARGINALIA_API_HOST
# - MARGINALIA_API_PORT
# - MARGINALIA_PAGE_SIZE
# - MARGINALIA_BLACKLIST_PATH
# - MARGINALIA_LOG_LEVEL
# - MARGINALIA_LOG_FORMAT

[storage]
# SQLite database holding annotations, documents and groups
database_path = "~/.local/share/marginalia/marginalia.db"

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 5000

# Allowed CORS origins
cors_origins = ["http://localhost:3000", "http://127.0.0.1:3000"]

# Request timeout in seconds
request_timeout_secs = 30

[activity]
# Maximum number of annotations returned per search
page_size = 200

[groups]
# Reserved group slugs, one per line
blacklist_path = "groups/blacklist"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/marginalia/marginalia.log"
"#
    .to_string()
}
