use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_sessions::Session;

use crate::{
    db,
    error::{AppError, AppResult},
    models::{ContentKind, GenrePreference, RatingStats},
    web,
};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct PreferencesResponse {
    pub user_id: i64,
    pub preferences: Vec<GenrePreference>,
}

/// Numeric `:id` segment; a non-numeric one is reported as not found
pub struct ApiId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for ApiId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<i64>::from_request_parts(parts, state)
            .await
            .map(|Path(id)| ApiId(id))
            .map_err(|rejection| AppError::NotFound(rejection.body_text()))
    }
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

async fn rating_stats(state: &AppState, kind: ContentKind, id: i64) -> AppResult<Json<RatingStats>> {
    db::analytics::get_rating_stats(&state.pool, kind, id)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!(error = %e, content = %kind, id, "Rating stats query failed");
            AppError::Internal("Failed to get rating stats".to_string())
        })
}

pub async fn movie_rating(
    State(state): State<AppState>,
    ApiId(movie_id): ApiId,
) -> AppResult<Json<RatingStats>> {
    rating_stats(&state, ContentKind::Movie, movie_id).await
}

pub async fn show_rating(
    State(state): State<AppState>,
    ApiId(show_id): ApiId,
) -> AppResult<Json<RatingStats>> {
    rating_stats(&state, ContentKind::Show, show_id).await
}

/// Genre weights for any user; requires a signed-in requester
pub async fn user_preferences(
    State(state): State<AppState>,
    session: Session,
    ApiId(user_id): ApiId,
) -> AppResult<Json<PreferencesResponse>> {
    if web::viewer(&session).await.is_none() {
        return Err(AppError::Unauthorized);
    }

    let preferences = db::genres::get_user_preferences(&state.pool, user_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id, "Preference query failed");
            AppError::Internal("Failed to get user preferences".to_string())
        })?;

    Ok(Json(PreferencesResponse {
        user_id,
        preferences,
    }))
}
