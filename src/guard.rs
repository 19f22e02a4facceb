//! Route guard — session check run before a protected page handler.
//!
//! DESIGN
//! ======
//! Each request to a protected path performs exactly one session lookup and
//! ends in one terminal outcome: redirect to the login page, continue with
//! the session attached to request extensions, or fail. The page handler
//! only runs on the continue branch, so a protected page never renders
//! without a session fetched for that same request.
//!
//! Lookup failures are not silently folded into "signed out": the
//! [`LookupFailurePolicy`] decides whether they redirect or render an error.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Serialize;

use crate::routes::pages;
use crate::session::{Session, SessionError, SessionLookup, SessionProvider};
use crate::state::AppState;

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/login";

// =============================================================================
// TYPES
// =============================================================================

/// What to do when the session lookup itself fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupFailurePolicy {
    /// Render a 502 error page.
    #[default]
    ErrorPage,
    /// Treat the visitor as signed out and redirect to login.
    Redirect,
}

/// Continuation context made available to the page after the guard passes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuardContext {
    pub session: Session,
}

/// Per-request navigation phase. `Pending` until the lookup resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationPhase {
    Pending,
    Redirecting,
    Continuing,
    Failed,
}

/// Terminal result of one guard run.
#[derive(Debug)]
pub enum GuardOutcome {
    Redirect(&'static str),
    Continue(GuardContext),
    Failed(SessionError),
}

impl GuardOutcome {
    #[must_use]
    pub fn phase(&self) -> NavigationPhase {
        match self {
            Self::Redirect(_) => NavigationPhase::Redirecting,
            Self::Continue(_) => NavigationPhase::Continuing,
            Self::Failed(_) => NavigationPhase::Failed,
        }
    }
}

// =============================================================================
// GUARD
// =============================================================================

/// Session guard shared by every protected route.
#[derive(Clone)]
pub struct RouteGuard {
    provider: Arc<dyn SessionProvider>,
    failure_policy: LookupFailurePolicy,
}

impl RouteGuard {
    #[must_use]
    pub fn new(provider: Arc<dyn SessionProvider>, failure_policy: LookupFailurePolicy) -> Self {
        Self { provider, failure_policy }
    }

    /// Run the session lookup once and decide the request's outcome.
    pub async fn check(&self, headers: &HeaderMap) -> GuardOutcome {
        match self.provider.get_session(headers).await {
            Ok(SessionLookup::Authenticated(session)) => GuardOutcome::Continue(GuardContext { session }),
            Ok(SessionLookup::Unauthenticated) => GuardOutcome::Redirect(LOGIN_PATH),
            Err(e) => match self.failure_policy {
                LookupFailurePolicy::Redirect => {
                    tracing::warn!(error = %e, "session lookup failed; treating visitor as signed out");
                    GuardOutcome::Redirect(LOGIN_PATH)
                }
                LookupFailurePolicy::ErrorPage => GuardOutcome::Failed(e),
            },
        }
    }
}

// =============================================================================
// MIDDLEWARE
// =============================================================================

/// Axum middleware applying [`RouteGuard`] in front of a page handler.
pub async fn require_session(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    tracing::trace!(%path, phase = ?NavigationPhase::Pending, "route guard started");
    let outcome = state.guard.check(request.headers()).await;
    tracing::debug!(%path, phase = ?outcome.phase(), "route guard resolved");

    match outcome {
        GuardOutcome::Redirect(to) => Redirect::to(to).into_response(),
        GuardOutcome::Continue(context) => {
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        GuardOutcome::Failed(e) => {
            tracing::error!(%path, error = %e, "session lookup failed");
            (StatusCode::BAD_GATEWAY, pages::lookup_failed()).into_response()
        }
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
