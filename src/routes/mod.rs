use std::any::Any;

use axum::{
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tower_sessions::{
    cookie::{Key, SameSite},
    Expiry, SessionManagerLayer, SessionStore,
};

use crate::{
    api::{api_routes, AppState},
    middleware::{make_span_with_request_id, request_id_middleware},
    web::templates,
};

pub mod admin;
pub mod analytics;
pub mod auth;
pub mod catalog;
pub mod entities;
pub mod recommendations;
pub mod reviews;
pub mod social;

/// Server-rendered pages
fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::home))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", get(auth::logout))
        // Catalog
        .route("/movies", get(catalog::movies))
        .route("/movie/:id", get(catalog::movie_detail))
        .route(
            "/movie/:id/edit",
            get(admin::edit_movie_inline_page).post(admin::edit_movie_inline),
        )
        .route("/shows", get(catalog::shows))
        .route("/show/:id", get(catalog::show_detail))
        .route("/celebrity/:id", get(catalog::celebrity_detail))
        .route(
            "/celebrity/:id/edit",
            get(entities::edit_celebrity_page).post(entities::edit_celebrity),
        )
        .route("/company/:id", get(catalog::company_detail))
        .route(
            "/company/:id/edit",
            get(entities::edit_company_page).post(entities::edit_company),
        )
        // Reviews
        .route("/add_review", get(reviews::add_review_page).post(reviews::add_review))
        .route(
            "/edit_review/:id",
            get(reviews::edit_review_page).post(reviews::edit_review),
        )
        .route("/delete_review/:id", post(reviews::delete_review))
        // Social
        .route("/recommendations", get(recommendations::recommendations))
        .route("/friends", get(social::friends))
        .route("/add_friend", post(social::add_friend))
        .route("/remove_friend", post(social::remove_friend))
        .route("/profile", get(social::profile))
        // Analytics
        .route("/analytics/popular", get(analytics::popular))
        .route("/analytics/top-rated", get(analytics::top_rated))
        .route("/analytics/users", get(analytics::users))
        .route("/analytics/friendships", get(analytics::friendships))
        .merge(admin_routes())
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin::dashboard))
        .route("/admin/users", get(admin::users))
        .route("/admin/users/:id/role", post(admin::set_user_role))
        .route("/admin/movies", get(admin::movies))
        .route("/admin/movies/add", get(admin::add_movie_page).post(admin::add_movie))
        .route(
            "/admin/movies/edit/:id",
            get(admin::edit_movie_page).post(admin::edit_movie),
        )
        .route("/admin/movies/delete/:id", post(admin::delete_movie))
        .route("/admin/shows", get(admin::shows))
        .route("/admin/shows/add", get(admin::add_show_page).post(admin::add_show))
        .route(
            "/admin/shows/edit/:id",
            get(admin::edit_show_page).post(admin::edit_show),
        )
        .route("/admin/shows/delete/:id", post(admin::delete_show))
        .route("/admin/genres", get(admin::genres))
        .route("/admin/add_genre", get(admin::add_genre_page).post(admin::add_genre))
        .route(
            "/admin/genres/edit/:id",
            get(admin::edit_genre_page).post(admin::edit_genre),
        )
        .route("/admin/genres/delete/:id", post(admin::delete_genre))
        .route("/admin/celebrities", get(admin::celebrities))
        .route(
            "/admin/add_celebrity",
            get(admin::add_celebrity_page).post(admin::add_celebrity),
        )
        .route("/admin/celebrities/delete/:id", post(admin::delete_celebrity))
        .route("/admin/companies", get(admin::companies))
        .route(
            "/admin/add_production_company",
            get(admin::add_company_page).post(admin::add_company),
        )
        .route("/admin/companies/delete/:id", post(admin::delete_company))
        .route("/admin/populate_preferences", post(admin::populate_preferences))
}

async fn not_found() -> Response {
    templates::not_found()
}

/// A panicking handler answers with the static 500 page
fn panic_page(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    tracing::error!(panic = detail, "Handler panicked");
    templates::server_error()
}

/// Every route, without middleware
pub fn routes(state: AppState) -> Router {
    Router::new()
        .merge(api_routes())
        .merge(page_routes())
        .fallback(not_found)
        .with_state(state)
}

/// Panic recovery, sessions, request tracing and request ids, outermost last
pub fn apply_layers<S>(router: Router, store: S, key: Key, ttl: time::Duration) -> Router
where
    S: SessionStore + Clone,
{
    let sessions = SessionManagerLayer::new(store)
        .with_signed(key)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(ttl));

    router
        .layer(CatchPanicLayer::custom(panic_page))
        .layer(sessions)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(axum::middleware::from_fn(request_id_middleware))
}

/// Creates the application router with all routes and middleware
pub fn create_router<S>(state: AppState, store: S, key: Key, ttl: time::Duration) -> Router
where
    S: SessionStore + Clone,
{
    apply_layers(routes(state), store, key, ttl)
}
