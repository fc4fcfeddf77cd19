use axum::{extract::State, response::Response};
use serde::Serialize;
use tower_sessions::Session;

use crate::{
    api::AppState,
    db,
    error::AppResult,
    models::{ActiveUser, ContentKind, FriendshipSimilarity, PopularItem, TopRatedItem},
    web::{self, render},
};

/// Unwraps an analytics read, flashing `message` when it failed
async fn or_flash<T: Default>(session: &Session, result: AppResult<T>, message: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(error = %e, "Analytics query failed");
            web::flash::error(session, message).await;
            T::default()
        }
    }
}

#[derive(Serialize)]
struct PopularPage {
    popular: Vec<PopularItem>,
}

pub async fn popular(State(state): State<AppState>, session: Session) -> Response {
    let popular = or_flash(
        &session,
        db::analytics::get_popular_content(&state.pool).await,
        "Error loading popular movies.",
    )
    .await;
    render(&state, &session, "analytics/popular.html", &PopularPage { popular }).await
}

#[derive(Serialize)]
struct TopRatedPage {
    top_movies: Vec<TopRatedItem>,
    top_shows: Vec<TopRatedItem>,
    min_reviews: i64,
}

pub async fn top_rated(State(state): State<AppState>, session: Session) -> Response {
    let message = "Error loading top rated content.";
    let top_movies = or_flash(
        &session,
        db::analytics::get_top_rated(&state.pool, ContentKind::Movie).await,
        message,
    )
    .await;
    let top_shows = or_flash(
        &session,
        db::analytics::get_top_rated(&state.pool, ContentKind::Show).await,
        message,
    )
    .await;

    let page = TopRatedPage {
        top_movies,
        top_shows,
        min_reviews: db::analytics::TOP_RATED_MIN_REVIEWS,
    };
    render(&state, &session, "analytics/top_rated.html", &page).await
}

#[derive(Serialize)]
struct UsersPage {
    active_users: Vec<ActiveUser>,
}

pub async fn users(State(state): State<AppState>, session: Session) -> Response {
    let active_users = or_flash(
        &session,
        db::analytics::get_active_users(&state.pool).await,
        "Error loading user analytics.",
    )
    .await;
    render(&state, &session, "analytics/users.html", &UsersPage { active_users }).await
}

#[derive(Serialize)]
struct FriendshipsPage {
    friendships: Vec<FriendshipSimilarity>,
}

pub async fn friendships(State(state): State<AppState>, session: Session) -> Response {
    let friendships = or_flash(
        &session,
        db::analytics::get_friendship_similarity(&state.pool).await,
        "Error loading friendship analytics.",
    )
    .await;
    render(
        &state,
        &session,
        "analytics/friendships.html",
        &FriendshipsPage { friendships },
    )
    .await
}
