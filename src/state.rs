//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers and middleware via the `State`
//! extractor. It holds the single [`RouteGuard`], which in turn owns the
//! session provider chosen at start-up.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, ProviderConfig};
use crate::guard::RouteGuard;
use crate::session::fixed::StaticSessionProvider;
use crate::session::http::HttpSessionProvider;
use crate::session::{Session, SessionError, SessionProvider};

/// Shared application state. Clone is required by Axum; the guard is Arc-backed.
#[derive(Clone)]
pub struct AppState {
    pub guard: RouteGuard,
}

impl AppState {
    #[must_use]
    pub fn new(guard: RouteGuard) -> Self {
        Self { guard }
    }

    /// Build state from parsed config, constructing the configured provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP session client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, SessionError> {
        let provider = build_provider(config)?;
        Ok(Self::new(RouteGuard::new(provider, config.failure_policy)))
    }
}

fn build_provider(config: &Config) -> Result<Arc<dyn SessionProvider>, SessionError> {
    match &config.provider {
        ProviderConfig::Http { base_url } => {
            let provider = HttpSessionProvider::new(
                base_url,
                config.session_cookie.clone(),
                Duration::from_secs(config.lookup_timeout_secs),
            )?;
            tracing::info!(url = provider.session_url(), cookie = %config.session_cookie, "using HTTP session provider");
            Ok(Arc::new(provider))
        }
        ProviderConfig::Static { session: Some(data) } => {
            tracing::warn!("using static session provider: every visitor is signed in");
            Ok(Arc::new(StaticSessionProvider::signed_in(Session::new(data.clone()))))
        }
        ProviderConfig::Static { session: None } => {
            tracing::warn!("using static session provider: every visitor is signed out");
            Ok(Arc::new(StaticSessionProvider::signed_out()))
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
