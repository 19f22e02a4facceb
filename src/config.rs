//! Service configuration parsed from environment variables.

use serde_json::Value;

use crate::guard::LookupFailurePolicy;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SESSION_COOKIE: &str = "session_token";
pub const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 10;

/// Errors produced while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid PORT: {0}")]
    InvalidPort(String),

    #[error("AUTH_BASE_URL is required when SESSION_PROVIDER=http")]
    MissingAuthBaseUrl,

    #[error("unknown SESSION_PROVIDER: {0}")]
    UnknownProvider(String),

    #[error("unknown AUTH_FAILURE_POLICY: {0}")]
    UnknownFailurePolicy(String),

    #[error("invalid AUTH_LOOKUP_TIMEOUT_SECS: {0}")]
    InvalidTimeout(String),

    #[error("STATIC_SESSION_JSON is not valid JSON: {0}")]
    InvalidStaticSession(String),
}

/// Which session provider to construct.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderConfig {
    Http { base_url: String },
    Static { session: Option<Value> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub provider: ProviderConfig,
    pub session_cookie: String,
    pub lookup_timeout_secs: u64,
    pub failure_policy: LookupFailurePolicy,
}

impl Config {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `SESSION_PROVIDER`: `http` (default) or `static`
    /// - `AUTH_BASE_URL`: required when the provider is `http`
    /// - `SESSION_COOKIE`: default `session_token`
    /// - `AUTH_LOOKUP_TIMEOUT_SECS`: default 10
    /// - `AUTH_FAILURE_POLICY`: `error` (default) or `redirect`
    /// - `STATIC_SESSION_JSON`: session for the `static` provider
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for any missing or malformed value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = parse_port(lookup("PORT").as_deref())?;
        let provider = match parse_provider_kind(lookup("SESSION_PROVIDER").as_deref())? {
            ProviderKind::Http => {
                let base_url = lookup("AUTH_BASE_URL")
                    .map(|v| v.trim().to_owned())
                    .filter(|v| !v.is_empty())
                    .ok_or(ConfigError::MissingAuthBaseUrl)?;
                ProviderConfig::Http { base_url }
            }
            ProviderKind::Static => {
                ProviderConfig::Static { session: parse_static_session(lookup("STATIC_SESSION_JSON").as_deref())? }
            }
        };
        let session_cookie = lookup("SESSION_COOKIE")
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_owned());
        let lookup_timeout_secs = parse_timeout(lookup("AUTH_LOOKUP_TIMEOUT_SECS").as_deref())?;
        let failure_policy = parse_failure_policy(lookup("AUTH_FAILURE_POLICY").as_deref())?;

        Ok(Self { port, provider, session_cookie, lookup_timeout_secs, failure_policy })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProviderKind {
    Http,
    Static,
}

fn parse_port(raw: Option<&str>) -> Result<u16, ConfigError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(DEFAULT_PORT),
        Some(v) => v.parse().map_err(|_| ConfigError::InvalidPort(v.to_owned())),
    }
}

fn parse_provider_kind(raw: Option<&str>) -> Result<ProviderKind, ConfigError> {
    match raw.unwrap_or("http").trim().to_ascii_lowercase().as_str() {
        "http" => Ok(ProviderKind::Http),
        "static" => Ok(ProviderKind::Static),
        other => Err(ConfigError::UnknownProvider(other.to_owned())),
    }
}

fn parse_failure_policy(raw: Option<&str>) -> Result<LookupFailurePolicy, ConfigError> {
    match raw.unwrap_or("error").trim().to_ascii_lowercase().as_str() {
        "error" => Ok(LookupFailurePolicy::ErrorPage),
        "redirect" => Ok(LookupFailurePolicy::Redirect),
        other => Err(ConfigError::UnknownFailurePolicy(other.to_owned())),
    }
}

fn parse_timeout(raw: Option<&str>) -> Result<u64, ConfigError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(DEFAULT_LOOKUP_TIMEOUT_SECS),
        Some(v) => match v.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(secs),
            _ => Err(ConfigError::InvalidTimeout(v.to_owned())),
        },
    }
}

fn parse_static_session(raw: Option<&str>) -> Result<Option<Value>, ConfigError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => serde_json::from_str(v)
            .map(Some)
            .map_err(|e| ConfigError::InvalidStaticSession(e.to_string())),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
