//! HTTP session provider.
//!
//! Thin wrapper around `GET {base}/api/auth/session`. Only the configured
//! session cookie is forwarded, exactly as the browser sent it (still
//! percent-encoded); other cookies on the incoming request stay with this
//! service. Redirects are not followed. Pure parsing in `parse_session_body`
//! for testability.

use std::time::Duration;

use axum::http::HeaderMap;
use axum_extra::extract::cookie::Cookie;
use reqwest::header::{ACCEPT, COOKIE};
use serde_json::Value;

use super::{SessionError, SessionLookup, SessionProvider};

pub const SESSION_PATH: &str = "/api/auth/session";
const CONNECT_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpSessionProvider {
    http: reqwest::Client,
    session_url: String,
    cookie_name: String,
}

impl HttpSessionProvider {
    /// Build a provider for the auth service rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn new(base_url: &str, cookie_name: impl Into<String>, timeout: Duration) -> Result<Self, SessionError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| SessionError::HttpClientBuild(e.to_string()))?;
        let session_url = format!("{}{SESSION_PATH}", base_url.trim_end_matches('/'));
        Ok(Self { http, session_url, cookie_name: cookie_name.into() })
    }

    #[must_use]
    pub fn session_url(&self) -> &str {
        &self.session_url
    }
}

#[async_trait::async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn get_session(&self, headers: &HeaderMap) -> Result<SessionLookup, SessionError> {
        let Some(token) = raw_cookie_value(headers, &self.cookie_name).filter(|t| !t.is_empty()) else {
            return Ok(SessionLookup::Unauthenticated);
        };

        let response = self
            .http
            .get(&self.session_url)
            .header(ACCEPT, "application/json")
            .header(COOKIE, format!("{}={token}", self.cookie_name))
            .send()
            .await
            .map_err(|e| SessionError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        // An expired or unknown token (401, or a redirect to a sign-in page) is
        // a signed-out visitor, not a failure.
        if status == 401 || (300..400).contains(&status) {
            return Ok(SessionLookup::Unauthenticated);
        }

        let text = response
            .text()
            .await
            .map_err(|e| SessionError::Request(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(SessionError::Status { status });
        }

        parse_session_body(&text)
    }
}

// =============================================================================
// PARSING
// =============================================================================

/// Value of cookie `name` as it appears on the wire, without percent-decoding.
///
/// Splitting on `;` before parsing means the returned value can never carry
/// another cookie along with it.
fn raw_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_owned())
}

/// Parse a session endpoint body.
///
/// Accepts either the bare session (`{"user": ...}`, `null`, `{}`) or an
/// envelope whose only key is `data` (`{"data": {...}}`, `{"data": null}`).
fn parse_session_body(text: &str) -> Result<SessionLookup, SessionError> {
    if text.trim().is_empty() {
        return Ok(SessionLookup::Unauthenticated);
    }

    let value: Value = serde_json::from_str(text).map_err(|e| SessionError::Parse(e.to_string()))?;
    let data = match value {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("data") => map.remove("data"),
        other => Some(other),
    };
    Ok(SessionLookup::from_data(data))
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
