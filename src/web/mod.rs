//! Glue shared by the page handlers: sessions, flash notices, rendering
//! and the redirects every form post ends in.

pub mod flash;
pub mod session;
pub mod templates;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::{header, request::Parts, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use sqlx::PgPool;
use tower_sessions::Session;

use crate::{
    api::AppState,
    db,
    error::AppResult,
    services::{access, Capability, Denied, Viewer},
};

pub use session::SessionUser;
pub use templates::render;

/// Page handlers answer with a page or an early redirect
pub type PageResult = Result<Response, Response>;

/// Numeric `:id` path segment. Anything that does not parse is a missing
/// page rather than a bad request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Id(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for Id
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<i64>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(Id(id)),
            Err(rejection) => {
                tracing::debug!(path = %parts.uri.path(), error = %rejection, "Unparseable id");
                Err(templates::not_found())
            }
        }
    }
}

/// 303 See Other
pub fn redirect(to: &str) -> Response {
    Redirect::to(to).into_response()
}

/// Back to the referring page, or `fallback` without one
pub fn back(headers: &HeaderMap, fallback: &str) -> Response {
    let target = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback);
    redirect(target)
}

/// Flashes an error and redirects
pub async fn fail(session: &Session, message: impl Into<String>, to: &str) -> Response {
    flash::error(session, message).await;
    redirect(to)
}

/// Page reads degrade to empty data instead of failing the page
pub fn fallback<T: Default>(result: AppResult<T>, what: &str) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, what, "Falling back to empty data");
        T::default()
    })
}

/// The viewer, if anyone is signed in
pub async fn viewer(session: &Session) -> Option<Viewer> {
    SessionUser::get(session).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Could not read session user");
        None
    })
}

/// The viewer with role and name re-read from the user row. The session is
/// brought up to date when they changed, and cleared when the user is gone.
/// A failed read keeps the session's copy.
pub async fn current_viewer(pool: &PgPool, session: &Session) -> Option<Viewer> {
    let stored = viewer(session).await?;

    match db::users::get_user_by_id(pool, stored.user_id).await {
        Ok(Some(user)) => {
            let fresh = Viewer::from(&user);
            remember(session, &stored, &fresh).await;
            Some(fresh)
        }
        Ok(None) => {
            tracing::warn!(user_id = stored.user_id, "Session refers to a missing user");
            if let Err(e) = SessionUser::forget(session).await {
                tracing::warn!(error = %e, "Could not clear stale session");
            }
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, user_id = stored.user_id, "Could not refresh session user");
            Some(stored)
        }
    }
}

async fn remember(session: &Session, stored: &Viewer, fresh: &Viewer) {
    if stored == fresh {
        return;
    }
    tracing::info!(user_id = fresh.user_id, role = fresh.role.as_str(), "Session user refreshed");
    if let Err(e) = SessionUser::refresh(session, fresh).await {
        tracing::warn!(error = %e, "Could not refresh session user");
    }
}

/// Checks `capability` for the requester and turns a denial into the
/// matching flash notice and redirect
pub async fn require(
    state: &AppState,
    session: &Session,
    capability: Capability,
) -> Result<Viewer, Response> {
    let session_user = viewer(session).await;

    match access::authorize(&state.pool, session_user.clone(), capability).await {
        Ok(fresh) => {
            if let Some(stored) = &session_user {
                remember(session, stored, &fresh).await;
            }
            Ok(fresh)
        }
        Err(denied) => Err(deny(session, denied).await),
    }
}

async fn deny(session: &Session, denied: Denied) -> Response {
    match denied {
        Denied::NotLoggedIn => fail(session, "Please log in to access this page.", "/login").await,
        Denied::UnknownUser(user_id) => {
            tracing::warn!(user_id, "Session refers to a missing user");
            if let Err(e) = SessionUser::logout(session).await {
                tracing::warn!(error = %e, "Could not clear stale session");
            }
            fail(session, "User not found.", "/login").await
        }
        Denied::NotAdmin => {
            tracing::warn!("Admin page requested without admin role");
            fail(session, "Access denied. Admin privileges required.", "/").await
        }
        Denied::NotPermitted(target) => {
            tracing::warn!(entity = target.type_str(), id = target.id(), "Edit denied");
            fail(session, "You do not have permission to edit this content.", "/").await
        }
        Denied::Backend(e) => {
            tracing::error!(error = %e, "Access check failed");
            fail(session, "Error checking access. Please try again.", "/").await
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderValue, StatusCode};

    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_back_prefers_referer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::REFERER, HeaderValue::from_static("/movie/4"));
        let response = back(&headers, "/");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/movie/4");

        let response = back(&HeaderMap::new(), "/movies");
        assert_eq!(response.headers()[header::LOCATION], "/movies");
    }

    #[test]
    fn test_fallback_substitutes_default() {
        let failed: AppResult<Vec<i64>> = Err(AppError::Internal("down".into()));
        assert!(fallback(failed, "movies").is_empty());
        assert_eq!(fallback(Ok(vec![1, 2]), "movies"), vec![1, 2]);
    }
}
