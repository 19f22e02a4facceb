//! Session lookup against the external auth service.
//!
//! DESIGN
//! ======
//! The auth service owns sessions; this crate only asks "is there one for
//! this request?". The answer is a discriminated [`SessionLookup`] so the
//! guard branches with an exhaustive match instead of a truthiness check.
//! Providers are injected behind [`SessionProvider`] so the guard can be
//! exercised with a mock in tests.

pub mod fixed;
pub mod http;

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced while looking up a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The request to the auth service failed (connect, timeout, body read).
    #[error("session request failed: {0}")]
    Request(String),

    /// The auth service returned a non-success HTTP status.
    #[error("session response error: status {status}")]
    Status { status: u16 },

    /// The auth service response body was not valid JSON.
    #[error("session response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// SESSION
// =============================================================================

/// Opaque session data as returned by the auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session(Value);

impl Session {
    #[must_use]
    pub fn new(data: Value) -> Self {
        Self(data)
    }

    /// Best-effort display label for the signed-in visitor.
    ///
    /// Looks at `user.name`, `name`, `user.email`, `email` and `userId`, in
    /// that order. The session shape is owned by the auth service, so any of
    /// these may be missing.
    #[must_use]
    pub fn display_label(&self) -> Option<&str> {
        let user = self.0.get("user");
        user.and_then(|u| u.get("name"))
            .or_else(|| self.0.get("name"))
            .or_else(|| user.and_then(|u| u.get("email")))
            .or_else(|| self.0.get("email"))
            .or_else(|| self.0.get("userId"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Result of a single session lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionLookup {
    Authenticated(Session),
    Unauthenticated,
}

impl SessionLookup {
    /// Classify the `data` field of a lookup response.
    ///
    /// Missing, `null`, `false`, `0`, `""`, `{}` and `[]` all mean no session.
    #[must_use]
    pub fn from_data(data: Option<Value>) -> Self {
        let Some(value) = data else {
            return Self::Unauthenticated;
        };
        let absent = match &value {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(n) => n.as_f64() == Some(0.0),
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Object(map) => map.is_empty(),
        };
        if absent { Self::Unauthenticated } else { Self::Authenticated(Session(value)) }
    }
}

// =============================================================================
// PROVIDER TRAIT
// =============================================================================

/// Capability to fetch the current visitor's session. Enables mocking in tests.
#[async_trait::async_trait]
pub trait SessionProvider: Send + Sync {
    /// Look up the session for the request carrying `headers`.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the lookup itself fails. A visitor who is
    /// simply not signed in is `Ok(SessionLookup::Unauthenticated)`.
    async fn get_session(&self, headers: &HeaderMap) -> Result<SessionLookup, SessionError>;
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
