//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Protected pages are registered from a static table and share one
//! `route_layer` running [`require_session`], so the guard only fires for
//! matched protected paths. `/login` and `/healthz` stay public.

pub mod pages;

use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::guard::{LOGIN_PATH, require_session};
use crate::state::AppState;
use pages::{Page, SessionContext};

/// A path bound to a page behind the session guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectedRoute {
    pub path: &'static str,
    pub page: Page,
}

pub const PROTECTED_ROUTES: [ProtectedRoute; 2] = [
    ProtectedRoute { path: "/library", page: Page::Bookshelf },
    ProtectedRoute { path: "/read-later", page: Page::ReadLater },
];

fn protected_routes(state: AppState) -> Router<AppState> {
    PROTECTED_ROUTES
        .iter()
        .fold(Router::new(), |router, route| {
            let page = route.page;
            router.route(route.path, get(move |ctx: SessionContext| async move { pages::render(page, &ctx) }))
        })
        .route_layer(middleware::from_fn_with_state(state, require_session))
}

/// Full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route(LOGIN_PATH, get(pages::login))
        .route("/healthz", get(healthz))
        .merge(protected_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
