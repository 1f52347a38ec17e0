//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use tracing::Level;
use uuid::Uuid;

use storecast_core::pagination::DEFAULT_PAGE_SIZE;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// How requests are attributed to a user.
///
/// `Required` validates the session cookie on every protected request.
/// `Demo` skips login entirely and attributes everything to the configured
/// placeholder user, mirroring the pre-auth build of the admin front-end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMode {
    Required,
    Demo,
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "required" => Ok(AuthMode::Required),
            "demo" => Ok(AuthMode::Demo),
            other => Err(format!("'{}' is not a valid auth mode", other)),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub auth_mode: AuthMode,
    pub demo_user_id: Uuid,
    pub page_size: u32,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Auth Settings ---
        let auth_mode_str = std::env::var("AUTH_MODE").unwrap_or_else(|_| "demo".to_string());
        let auth_mode = auth_mode_str
            .parse::<AuthMode>()
            .map_err(|e| ConfigError::InvalidValue("AUTH_MODE".to_string(), e))?;

        let demo_user_id = match std::env::var("DEMO_USER_ID") {
            Ok(raw) => raw.parse::<Uuid>().map_err(|e| {
                ConfigError::InvalidValue("DEMO_USER_ID".to_string(), e.to_string())
            })?,
            Err(_) => Uuid::nil(),
        };

        // --- Load Application Settings ---
        let page_size = match std::env::var("PAGE_SIZE") {
            Ok(raw) => {
                let parsed = raw.parse::<u32>().map_err(|e| {
                    ConfigError::InvalidValue("PAGE_SIZE".to_string(), e.to_string())
                })?;
                if parsed == 0 {
                    return Err(ConfigError::InvalidValue(
                        "PAGE_SIZE".to_string(),
                        "must be at least 1".to_string(),
                    ));
                }
                parsed
            }
            Err(_) => DEFAULT_PAGE_SIZE,
        };

        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            auth_mode,
            demo_user_id,
            page_size,
            cors_origin,
        })
    }
}
