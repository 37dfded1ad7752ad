//! services/functions/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;

use chrono::NaiveTime;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Gemini's OpenAI-compatible endpoint.
pub const DEFAULT_GEMINI_API_BASE: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai";

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// `None` runs against the in-memory store.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub ai_fetch_interval_hours: i64,
    pub trending_at: NaiveTime,
    pub hook_secret: Option<String>,
    pub allowed_origin: String,
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
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable lookup.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // --- Server and Database Settings ---
        let bind_address_str = var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = var("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Generative Text API (key optional) ---
        let gemini_api_key = var("GEMINI_API_KEY").filter(|key| !key.trim().is_empty());
        let gemini_model =
            var("GEMINI_MODEL").unwrap_or_else(|| "gemini-2.0-flash-lite".to_string());
        let gemini_api_base =
            var("GEMINI_API_BASE").unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string());

        // --- Schedules ---
        let ai_fetch_interval_hours = match var("AI_FETCH_INTERVAL_HOURS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|hours| *hours > 0)
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "AI_FETCH_INTERVAL_HOURS".to_string(),
                        format!("'{}' is not a positive number of hours", raw),
                    )
                })?,
            None => 6,
        };

        let trending_at_str = var("TRENDING_AT").unwrap_or_else(|| "00:05".to_string());
        let trending_at = NaiveTime::parse_from_str(&trending_at_str, "%H:%M").map_err(|e| {
            ConfigError::InvalidValue("TRENDING_AT".to_string(), e.to_string())
        })?;

        // --- HTTP Surface ---
        let hook_secret = var("HOOK_SECRET").filter(|secret| !secret.is_empty());
        let allowed_origin =
            var("ALLOWED_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            gemini_api_key,
            gemini_model,
            gemini_api_base,
            ai_fetch_interval_hours,
            trending_at,
            hook_secret,
            allowed_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_cover_an_empty_environment() {
        let config = load(&[]).unwrap();

        assert_eq!(config.bind_address.port(), 8080);
        assert!(config.database_url.is_none());
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.gemini_model, "gemini-2.0-flash-lite");
        assert_eq!(config.ai_fetch_interval_hours, 6);
        assert_eq!(config.trending_at, NaiveTime::from_hms_opt(0, 5, 0).unwrap());
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let config = load(&[("GEMINI_API_KEY", "  "), ("DATABASE_URL", "")]).unwrap();

        assert!(config.gemini_api_key.is_none());
        assert!(config.database_url.is_none());
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(matches!(
            load(&[("TRENDING_AT", "25:99")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "TRENDING_AT"
        ));
        assert!(matches!(
            load(&[("AI_FETCH_INTERVAL_HOURS", "0")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "AI_FETCH_INTERVAL_HOURS"
        ));
        assert!(load(&[("BIND_ADDRESS", "nowhere")]).is_err());
    }
}
