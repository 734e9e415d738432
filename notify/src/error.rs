//! Error types for the notification subsystem.
//!
//! The scheduling path never propagates errors to the host application:
//! permission denial, missing data, and dispatch failures are all absorbed
//! into no-ops or defaults. These types exist for the edges where a caller
//! can meaningfully react, namely configuration loading and the API client.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::dispatch::DispatchError;

/// Errors that can surface from this crate's fallible edges.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Configuration-related error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Settings/Activity API error.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Notification dispatch error.
    ///
    /// Only visible to sink implementors; the dispatcher itself converts
    /// this into a logged `false`.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
