//! Error types shared by the transport, storage, and store layers.
//!
//! ERROR HANDLING
//! ==============
//! `ApiError` describes what went wrong on the wire. Stores wrap it in a
//! `StoreError` carrying the localized text a UI should display, taken from
//! the server's `detail` field when one was sent, else a generic fallback.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use serde_json::Value;

/// Errors produced by REST binding calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (connect, timeout, TLS).
    #[error("request failed: {0}")]
    Transport(String),

    /// The backend answered with a non-success HTTP status.
    #[error("server returned status {status}")]
    Status { status: u16, detail: Option<String> },

    /// The response body did not match the expected shape.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

impl ApiError {
    /// Build a status error from a raw response body.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        Self::Status { status, detail: detail_from_body(body) }
    }

    /// Server-provided human-readable detail, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// HTTP status code, if the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Extract a string `detail` field from a JSON error body.
///
/// Validation errors carry `detail` as an array of objects; those are not
/// user-facing text and are ignored.
pub(crate) fn detail_from_body(body: &str) -> Option<String> {
    let value = serde_json::from_str::<Value>(body).ok()?;
    let detail = value.get("detail")?.as_str()?.trim();
    if detail.is_empty() {
        return None;
    }
    Some(detail.to_owned())
}

/// A store operation failure carrying the text to show the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct StoreError {
    message: String,
    #[source]
    source: ApiError,
}

impl StoreError {
    /// Pair an API failure with its user-facing message.
    #[must_use]
    pub fn new(message: impl Into<String>, source: ApiError) -> Self {
        Self { message: message.into(), source }
    }

    /// Use the server detail when present, else `fallback`.
    #[must_use]
    pub fn with_fallback(source: ApiError, fallback: &str) -> Self {
        let message = source.detail().unwrap_or(fallback).to_owned();
        Self { message, source }
    }

    /// Localized, user-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Underlying transport/status failure.
    #[must_use]
    pub fn api_error(&self) -> &ApiError {
        &self.source
    }
}

/// Failures of the local blob store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failed for {target}: {source}")]
    Io { target: String, source: std::io::Error },

    #[error("invalid JSON in {target}: {source}")]
    Json { target: String, source: serde_json::Error },
}

/// Invalid client configuration values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("unsupported locale '{0}' (expected 'en' or 'vi')")]
    InvalidLocale(String),

    #[error("base URL must start with http:// or https://, got '{0}'")]
    InvalidBaseUrl(String),
}

/// Route resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("too many redirects while navigating to '{0}'")]
    TooManyRedirects(String),
}
