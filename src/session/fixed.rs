//! Fixed-answer session provider for local development.

use axum::http::HeaderMap;

use super::{Session, SessionError, SessionLookup, SessionProvider};

/// Returns the same lookup for every request, ignoring cookies.
pub struct StaticSessionProvider {
    lookup: SessionLookup,
}

impl StaticSessionProvider {
    #[must_use]
    pub fn signed_in(session: Session) -> Self {
        Self { lookup: SessionLookup::Authenticated(session) }
    }

    #[must_use]
    pub fn signed_out() -> Self {
        Self { lookup: SessionLookup::Unauthenticated }
    }
}

#[async_trait::async_trait]
impl SessionProvider for StaticSessionProvider {
    async fn get_session(&self, _headers: &HeaderMap) -> Result<SessionLookup, SessionError> {
        Ok(self.lookup.clone())
    }
}
