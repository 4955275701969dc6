//! Configuration management
//!
//! This module handles loading and parsing configuration for the GeoBit
//! newsletter system. Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Admin authentication configuration
    #[serde(default)]
    pub admin: AdminConfig,
    /// LLM aggregation API configuration
    #[serde(default)]
    pub llm: LlmConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/geobit.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Admin authentication configuration
///
/// When `secret` is unset, real authentication is disabled and login accepts
/// only the fixed development password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Shared admin secret; unset means development mode
    #[serde(default)]
    pub secret: Option<String>,
    /// Session lifetime in hours
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            secret: None,
            session_ttl_hours: default_session_ttl_hours(),
        }
    }
}

fn default_session_ttl_hours() -> i64 {
    24
}

/// LLM aggregation API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key for the aggregation service
    #[serde(default)]
    pub api_key: Option<String>,
    /// Chat-completion endpoint
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// Primary summarization model
    #[serde(default = "default_summary_model")]
    pub summary_model: String,
    /// Ordered fallback models tried by the backend on primary failure
    #[serde(default = "default_fallback_models")]
    pub fallback_models: Vec<String>,
    /// Web-search-augmented model used for enhancement and article search
    #[serde(default = "default_search_model")]
    pub search_model: String,
    /// Maximum completion tokens per request
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_llm_base_url(),
            summary_model: default_summary_model(),
            fallback_models: default_fallback_models(),
            search_model: default_search_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_llm_base_url() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}

fn default_summary_model() -> String {
    "anthropic/claude-3.5-sonnet".to_string()
}

fn default_fallback_models() -> Vec<String> {
    vec![
        "openai/gpt-4o-mini".to_string(),
        "google/gemini-flash-1.5".to_string(),
    ]
}

fn default_search_model() -> String {
    "perplexity/sonar".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist or is empty, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Recognized variables:
    /// - GEOBIT_SERVER_HOST, GEOBIT_SERVER_PORT, GEOBIT_SERVER_CORS_ORIGIN
    /// - GEOBIT_DATABASE_DRIVER, GEOBIT_DATABASE_URL
    /// - GEOBIT_ADMIN_SECRET
    /// - GEOBIT_LLM_API_KEY, GEOBIT_LLM_BASE_URL
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("GEOBIT_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("GEOBIT_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("GEOBIT_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Ok(driver) = std::env::var("GEOBIT_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(url) = std::env::var("GEOBIT_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(secret) = std::env::var("GEOBIT_ADMIN_SECRET") {
            if !secret.is_empty() {
                self.admin.secret = Some(secret);
            }
        }

        if let Ok(api_key) = std::env::var("GEOBIT_LLM_API_KEY") {
            if !api_key.is_empty() {
                self.llm.api_key = Some(api_key);
            }
        }
        if let Ok(base_url) = std::env::var("GEOBIT_LLM_BASE_URL") {
            self.llm.base_url = base_url;
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}
