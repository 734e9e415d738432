//! Client for the member API's settings and activity endpoints.
//!
//! Absence is not an error: a 404 means the user has no stored record and
//! the caller applies defaults. Transport failures, server errors, and
//! undecodable bodies are real errors, but the host absorbs them by
//! skipping that scheduling cycle and retrying on the next one; nothing
//! here ever reaches the user.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::types::{NotificationSettings, UserActivitySnapshot};

/// HTTP request timeout.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Errors that can occur talking to the member API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport-level failure (connection refused, timeout, DNS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an unexpected status.
    #[error("server error: {status}")]
    Status { status: u16 },

    /// Response body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
}

/// HTTP client for settings and activity reads.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    /// Creates a client for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .pool_max_idle_per_host(4)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Fetches a user's notification settings.
    ///
    /// `Ok(None)` means the user has no stored settings; apply defaults.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, a non-404 error status,
    /// or an undecodable body.
    pub async fn fetch_settings(
        &self,
        user_id: Uuid,
    ) -> Result<Option<NotificationSettings>, ApiError> {
        let url = format!("{}/users/{user_id}/notification-settings", self.base_url);
        self.fetch(&url).await
    }

    /// Fetches a user's activity snapshot.
    ///
    /// `Ok(None)` means no recorded activity; treat as a new user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, a non-404 error status,
    /// or an undecodable body.
    pub async fn fetch_activity(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserActivitySnapshot>, ApiError> {
        let url = format!("{}/users/{user_id}/activity", self.base_url);
        self.fetch(&url).await
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, ApiError> {
        debug!(url = %url, "Fetching from member API");

        let response = self.client.get(url).send().await?;
        let status = response.status();

        match status {
            StatusCode::OK => {
                let value = response
                    .json::<T>()
                    .await
                    .map_err(|err| ApiError::Decode(err.to_string()))?;
                Ok(Some(value))
            }
            StatusCode::NOT_FOUND => {
                debug!(url = %url, "Resource absent, caller will apply defaults");
                Ok(None)
            }
            _ => {
                warn!(url = %url, status = status.as_u16(), "Unexpected API status");
                Err(ApiError::Status {
                    status: status.as_u16(),
                })
            }
        }
    }
}
