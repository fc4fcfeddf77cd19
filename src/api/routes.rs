use axum::{routing::get, Router};

use super::handlers;
use super::AppState;

/// JSON endpoints
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/movie/:id/rating", get(handlers::movie_rating))
        .route("/api/show/:id/rating", get(handlers::show_rating))
        .route("/api/user/:id/preferences", get(handlers::user_preferences))
}
