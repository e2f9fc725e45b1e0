//! Error types for the Platform API client.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlatformApiError>;

#[derive(Debug, Error)]
pub enum PlatformApiError {
    /// Malformed scope tuple or repository name (§4.1 scope dispatch).
    #[error("{0}")]
    Validation(String),

    /// Non-success HTTP status from the Platform.
    #[error("platform api request to {path} failed with status {status}")]
    Http {
        status: u16,
        path: String,
        body: String,
    },

    /// Transport-level failure (DNS, TLS, connection reset, timeout).
    #[error("platform api transport error: {0}")]
    Request(#[from] reqwest::Error),

    /// Failure constructing the app-installation transport. The message is
    /// sanitized to the key's size and first line only - never the whole key.
    #[error("failed to construct app-installation auth: {0}")]
    Auth(String),

    #[error("runner not found: {name}")]
    RunnerNotFound { name: String },

    /// Carries the runner's last-known busy flag alongside the offline
    /// signal, so a caller that matches on this variant still learns
    /// whether the runner was mid-job when it dropped off (§7).
    #[error("runner {name} is offline (busy={busy})")]
    RunnerOffline { name: String, busy: bool },
}

impl PlatformApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn invalid_repository_name(repo: &str) -> Self {
        Self::Validation(format!("invalid repository name: '{}'", repo))
    }
}
