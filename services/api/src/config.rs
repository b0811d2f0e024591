//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

/// Longest accepted login session.
pub const MAX_SESSION_TTL_DAYS: i64 = 3650;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// When unset the service keeps its data in process memory.
    pub database_url: Option<String>,
    /// An `EnvFilter` directive string, e.g. `info,tower_http=debug`.
    pub log_filter: String,
    pub openai_api_key: Option<String>,
    pub quiz_model: String,
    pub feedback_model: String,
    pub content_model: String,
    pub image_model: String,
    pub cors_origin: String,
    pub session_ttl_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: None,
            log_filter: "info".to_string(),
            openai_api_key: None,
            quiz_model: "gpt-4o".to_string(),
            feedback_model: "gpt-4o-mini".to_string(),
            content_model: "gpt-4o-mini".to_string(),
            image_model: "dall-e-3".to_string(),
            cors_origin: "http://localhost:3000".to_string(),
            session_ttl_days: 30,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // --- Server and Database Settings ---
        let bind_address = match lookup("BIND_ADDRESS") {
            Some(raw) => raw.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
            })?,
            None => defaults.bind_address,
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let log_filter = match lookup("RUST_LOG") {
            Some(raw) => {
                EnvFilter::try_new(&raw).map_err(|e| {
                    ConfigError::InvalidValue("RUST_LOG".to_string(), e.to_string())
                })?;
                raw
            }
            None => defaults.log_filter,
        };

        // --- Model Settings ---
        let openai_api_key = lookup("OPENAI_API_KEY");
        let quiz_model = lookup("QUIZ_MODEL").unwrap_or(defaults.quiz_model);
        let feedback_model = lookup("FEEDBACK_MODEL").unwrap_or(defaults.feedback_model);
        let content_model = lookup("CONTENT_MODEL").unwrap_or(defaults.content_model);
        let image_model = lookup("IMAGE_MODEL").unwrap_or(defaults.image_model);

        // --- Web Settings ---
        let cors_origin = lookup("CORS_ORIGIN").unwrap_or(defaults.cors_origin);
        let session_ttl_days = match lookup("SESSION_TTL_DAYS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|days| (1..=MAX_SESSION_TTL_DAYS).contains(days))
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "SESSION_TTL_DAYS".to_string(),
                        format!("'{}' is not between 1 and {} days", raw, MAX_SESSION_TTL_DAYS),
                    )
                })?,
            None => defaults.session_ttl_days,
        };

        Ok(Self {
            bind_address,
            database_url,
            log_filter,
            openai_api_key,
            quiz_model,
            feedback_model,
            content_model,
            image_model,
            cors_origin,
            session_ttl_days,
        })
    }

    /// The API key is only needed once the real model adapters are built.
    pub fn require_openai_api_key(&self) -> Result<&str, ConfigError> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))
    }
}
