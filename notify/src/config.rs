//! Configuration for the notification agent.
//!
//! Parsed from environment variables:
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `FORGEPATH_API_URL` | Yes | - | Base URL of the member API |
//! | `FORGEPATH_USER_ID` | Yes | - | Member UUID to schedule for |
//! | `FORGEPATH_STALL_THRESHOLD_DAYS` | No | 7 | Days without progress before a course counts as stalled |
//! | `FORGEPATH_REINIT_INTERVAL_SECS` | No | 86400 | Seconds between scheduler re-initializations |
//!
//! # Example
//!
//! ```no_run
//! use forgepath_notify::config::Config;
//!
//! let config = Config::from_env().expect("Failed to load configuration");
//! println!("API URL: {}", config.api_url);
//! ```

use std::env;

use thiserror::Error;
use uuid::Uuid;

/// Default stalled-course threshold in days.
pub const DEFAULT_STALL_THRESHOLD_DAYS: u32 = 7;

/// Default re-initialization cadence: once per day.
const DEFAULT_REINIT_INTERVAL_SECS: u64 = 86_400;

/// Errors that can occur during configuration parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Environment variable has an invalid value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Configuration for the notification agent.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the member API (e.g., `https://api.forgepath.app`).
    pub api_url: String,

    /// The member the agent schedules notifications for.
    pub user_id: Uuid,

    /// Days without progress before a course counts as stalled.
    pub stall_threshold_days: u32,

    /// Seconds between scheduler re-initializations.
    pub reinit_interval_secs: u64,
}

impl Config {
    /// Creates a new `Config` by parsing environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if:
    /// - `FORGEPATH_API_URL` or `FORGEPATH_USER_ID` is not set
    /// - `FORGEPATH_USER_ID` is not a valid UUID
    /// - a numeric variable is set but cannot be parsed, or is zero
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = env::var("FORGEPATH_API_URL")
            .map_err(|_| ConfigError::MissingEnvVar("FORGEPATH_API_URL".to_string()))?;

        let user_id_raw = env::var("FORGEPATH_USER_ID")
            .map_err(|_| ConfigError::MissingEnvVar("FORGEPATH_USER_ID".to_string()))?;
        let user_id = Uuid::parse_str(&user_id_raw).map_err(|_| ConfigError::InvalidValue {
            key: "FORGEPATH_USER_ID".to_string(),
            message: format!("expected UUID, got '{user_id_raw}'"),
        })?;

        let stall_threshold_raw = parse_positive_u64(
            "FORGEPATH_STALL_THRESHOLD_DAYS",
            u64::from(DEFAULT_STALL_THRESHOLD_DAYS),
        )?;
        let stall_threshold_days =
            u32::try_from(stall_threshold_raw).map_err(|_| ConfigError::InvalidValue {
                key: "FORGEPATH_STALL_THRESHOLD_DAYS".to_string(),
                message: format!("value {stall_threshold_raw} is out of range"),
            })?;

        let reinit_interval_secs =
            parse_positive_u64("FORGEPATH_REINIT_INTERVAL_SECS", DEFAULT_REINIT_INTERVAL_SECS)?;

        Ok(Self {
            api_url,
            user_id,
            stall_threshold_days,
            reinit_interval_secs,
        })
    }
}

/// Parses an optional positive integer variable, rejecting zero.
fn parse_positive_u64(key: &str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(val) => {
            let parsed = val.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected positive integer, got '{val}'"),
            })?;
            if parsed == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "value must be greater than 0".to_string(),
                });
            }
            Ok(parsed)
        }
        Err(_) => Ok(default),
    }
}
