//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::i18n::Locale;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_STATE_PATH: &str = ".realchat/session.json";
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// REST root including the `/api` prefix, without trailing slash.
    pub base_url: String,
    /// JSON file backing the session blob store.
    pub state_path: PathBuf,
    pub locale: Locale,
    /// Page size for private and room history requests.
    pub history_limit: u32,
    pub timeouts: Timeouts,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            locale: Locale::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            timeouts: Timeouts::default(),
        }
    }
}

impl ClientConfig {
    /// Build typed config from the process environment.
    ///
    /// Optional:
    /// - `REALCHAT_BASE_URL`: default `http://127.0.0.1:8000/api`
    /// - `REALCHAT_STATE_PATH`: default `.realchat/session.json`
    /// - `REALCHAT_LOCALE`: `en` (default) or `vi`
    /// - `REALCHAT_HISTORY_LIMIT`: default 50
    /// - `REALCHAT_REQUEST_TIMEOUT_SECS`: default 30
    /// - `REALCHAT_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any present value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build typed config from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any present value fails to parse.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = match lookup("REALCHAT_BASE_URL") {
            Some(raw) => normalize_base_url(&raw)?,
            None => DEFAULT_BASE_URL.to_owned(),
        };
        let state_path = lookup("REALCHAT_STATE_PATH")
            .filter(|raw| !raw.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_STATE_PATH), PathBuf::from);
        let locale = match lookup("REALCHAT_LOCALE") {
            Some(raw) => Locale::parse(&raw)?,
            None => Locale::default(),
        };
        let history_limit = parse_positive(&lookup, "REALCHAT_HISTORY_LIMIT", u64::from(DEFAULT_HISTORY_LIMIT))?;
        let history_limit = u32::try_from(history_limit).map_err(|_| ConfigError::InvalidNumber {
            var: "REALCHAT_HISTORY_LIMIT",
            value: history_limit.to_string(),
        })?;
        let timeouts = Timeouts {
            request_secs: parse_positive(&lookup, "REALCHAT_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: parse_positive(&lookup, "REALCHAT_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };

        Ok(Self { base_url, state_path, locale, history_limit, timeouts })
    }
}

/// Trim trailing slashes and require an http(s) scheme.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidBaseUrl`] for other schemes.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl(raw.to_owned()));
    }
    Ok(trimmed.to_owned())
}

fn parse_positive<F>(lookup: &F, var: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidNumber { var, value: raw }),
    }
}
