use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use tera::{Context, Tera};
use tower_sessions::Session;

use super::flash;
use crate::{api::AppState, error::AppResult, models::Role};

const NOT_FOUND_PAGE: &str = include_str!("../../templates/errors/404.html");
const SERVER_ERROR_PAGE: &str = include_str!("../../templates/errors/500.html");

/// Loads every template under `templates/`
pub fn load() -> AppResult<Tera> {
    let tera = Tera::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*.html"))?;
    tracing::info!(count = tera.get_template_names().count(), "Templates loaded");
    Ok(tera)
}

pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE)).into_response()
}

pub fn server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Html(SERVER_ERROR_PAGE)).into_response()
}

/// Renders `template` with `data` plus the layout variables every page
/// reads: `current_user`, `is_admin` and the queued `flashes`.
pub async fn render<T: Serialize>(
    state: &AppState,
    session: &Session,
    template: &str,
    data: &T,
) -> Response {
    let mut context = match Context::from_serialize(data) {
        Ok(context) => context,
        Err(e) => {
            tracing::error!(template, error = %e, "Failed to build template context");
            return server_error();
        }
    };

    let current_user = super::current_viewer(&state.pool, session).await;
    let is_admin = current_user
        .as_ref()
        .is_some_and(|viewer| viewer.role == Role::Admin);

    context.insert("current_user", &current_user);
    context.insert("is_admin", &is_admin);
    context.insert("flashes", &flash::take(session).await);

    match state.templates.render(template, &context) {
        Ok(body) => Html(body).into_response(),
        Err(e) => {
            tracing::error!(template, error = ?e, "Failed to render template");
            server_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_parse() {
        let tera = load().unwrap();
        for name in ["base.html", "home.html", "movies.html", "admin/dashboard.html"] {
            assert!(
                tera.get_template_names().any(|t| t == name),
                "missing template {name}"
            );
        }
    }

    #[test]
    fn test_static_error_pages() {
        assert_eq!(not_found().status(), StatusCode::NOT_FOUND);
        assert_eq!(server_error().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
