use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{Genre, GenrePreference},
};

pub async fn list_genres(pool: &PgPool) -> AppResult<Vec<Genre>> {
    let genres = sqlx::query_as::<_, Genre>(
        "SELECT genre_id, name, description FROM genres ORDER BY LOWER(name), name",
    )
    .fetch_all(pool)
    .await?;
    Ok(genres)
}

pub async fn get_genre(pool: &PgPool, genre_id: i64) -> AppResult<Option<Genre>> {
    let genre = sqlx::query_as::<_, Genre>(
        "SELECT genre_id, name, description FROM genres WHERE genre_id = $1",
    )
    .bind(genre_id)
    .fetch_optional(pool)
    .await?;
    Ok(genre)
}

/// A duplicate name surfaces as [`crate::error::AppError::Duplicate`]
pub async fn create_genre(pool: &PgPool, name: &str, description: Option<&str>) -> AppResult<i64> {
    let genre_id: i64 = sqlx::query_scalar(
        "INSERT INTO genres (name, description) VALUES ($1, $2) RETURNING genre_id",
    )
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await?;

    tracing::info!(genre_id, name, "Genre created");
    Ok(genre_id)
}

pub async fn update_genre(
    pool: &PgPool,
    genre_id: i64,
    name: &str,
    description: Option<&str>,
) -> AppResult<bool> {
    let updated = sqlx::query("UPDATE genres SET name = $1, description = $2 WHERE genre_id = $3")
        .bind(name)
        .bind(description)
        .bind(genre_id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(updated > 0)
}

/// Removing a genre drops its movie, show and preference links
pub async fn delete_genre(pool: &PgPool, genre_id: i64) -> AppResult<bool> {
    let deleted = sqlx::query("DELETE FROM genres WHERE genre_id = $1")
        .bind(genre_id)
        .execute(pool)
        .await?
        .rows_affected();

    if deleted > 0 {
        tracing::info!(genre_id, "Genre deleted");
    }
    Ok(deleted > 0)
}

/// Every genre with the user's stored weight; scored genres first
pub async fn get_user_preferences(pool: &PgPool, user_id: i64) -> AppResult<Vec<GenrePreference>> {
    let preferences = sqlx::query_as::<_, GenrePreference>(
        r#"
        SELECT g.genre_id, g.name, g.description, up.preference_score
        FROM genres g
        LEFT JOIN user_preferences up ON up.genre_id = g.genre_id AND up.user_id = $1
        ORDER BY up.preference_score DESC NULLS LAST, g.name
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(preferences)
}
