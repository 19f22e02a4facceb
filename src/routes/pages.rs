//! Page handlers for the guarded reading views.
//!
//! Pages receive the guard's [`GuardContext`] through the [`SessionContext`]
//! extractor and embed it as a JSON data island for client-side code.

use askama::Template;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::Html;

use crate::guard::GuardContext;

/// Pages that sit behind the session guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Bookshelf,
    ReadLater,
}

impl Page {
    #[must_use]
    pub fn component(self) -> &'static str {
        match self {
            Self::Bookshelf => "BookshelfPage",
            Self::ReadLater => "ReadLaterPage",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Bookshelf => "Library",
            Self::ReadLater => "Read later",
        }
    }
}

// =============================================================================
// SESSION EXTRACTOR
// =============================================================================

/// Continuation context left in request extensions by the guard.
///
/// Rejects with 500 when missing: a page reached without the guard is a
/// routing bug and must not render.
pub struct SessionContext(pub GuardContext);

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<GuardContext>().cloned().map(Self).ok_or_else(|| {
            tracing::error!(path = %parts.uri.path(), "page reached without guard context");
            StatusCode::INTERNAL_SERVER_ERROR
        })
    }
}

// =============================================================================
// TEMPLATES
// =============================================================================

/// Guarded page shell. `island` is pre-escaped JSON and rendered unescaped.
#[derive(Template)]
#[template(path = "page.html")]
struct GuardedPageTemplate<'a> {
    title: &'a str,
    component: &'a str,
    label: Option<&'a str>,
    island: String,
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate;

#[derive(Template)]
#[template(path = "lookup_failed.html")]
struct LookupFailedTemplate;

fn render_template(template: &impl Template) -> Result<Html<String>, StatusCode> {
    template.render().map(Html).map_err(|e| {
        tracing::error!(error = %e, "template render failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

// =============================================================================
// RENDERING
// =============================================================================

/// Render a guarded page with its session context.
///
/// # Errors
///
/// Returns 500 if the template fails to render.
pub fn render(page: Page, ctx: &SessionContext) -> Result<Html<String>, StatusCode> {
    let context = &ctx.0;
    render_template(&GuardedPageTemplate {
        title: page.title(),
        component: page.component(),
        label: context.session.display_label(),
        island: json_island(context),
    })
}

/// `GET /login` — public placeholder; the sign-in flow lives in the auth service.
pub async fn login() -> Result<Html<String>, StatusCode> {
    render_template(&LoginTemplate)
}

/// Body for a failed session lookup.
///
/// # Errors
///
/// Returns 500 if the template fails to render.
pub fn lookup_failed() -> Result<Html<String>, StatusCode> {
    render_template(&LookupFailedTemplate)
}

/// Serialize the context for a `<script>` data island.
///
/// `<`, `>` and `&` become JSON unicode escapes so the payload cannot close
/// the script element; the result is still the same JSON value.
fn json_island(ctx: &GuardContext) -> String {
    serde_json::to_string(ctx)
        .unwrap_or_else(|_| "null".to_owned())
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
