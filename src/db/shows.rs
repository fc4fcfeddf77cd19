use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::AppResult,
    models::{CatalogFilter, Genre, ReviewWithTitles, ShowInput, ShowSummary},
};

const SUMMARY_SELECT: &str = r#"
    SELECT s.show_id, s.title, s.description, s.year, s.seasons, s.episodes, s.age_rating,
           s.created_at, s.updated_at,
           COUNT(r.review_id) AS review_count,
           ROUND(AVG(r.score)::numeric, 2)::float8 AS avg_rating
    FROM tv_shows s
    LEFT JOIN reviews r ON r.show_id = s.show_id
"#;

/// Shows matching the optional genre and title filters, by title
pub async fn list_shows(pool: &PgPool, filter: &CatalogFilter) -> AppResult<Vec<ShowSummary>> {
    let mut query = QueryBuilder::<Postgres>::new(SUMMARY_SELECT);
    query.push(" WHERE TRUE");

    if let Some(genre_id) = filter.genre {
        query
            .push(" AND EXISTS (SELECT 1 FROM show_genres sg WHERE sg.show_id = s.show_id AND sg.genre_id = ")
            .push_bind(genre_id)
            .push(")");
    }

    if let Some(pattern) = filter.title_pattern() {
        query.push(" AND s.title ILIKE ").push_bind(pattern);
    }

    query.push(" GROUP BY s.show_id ORDER BY LOWER(s.title), s.title, s.show_id");

    let shows = query.build_query_as::<ShowSummary>().fetch_all(pool).await?;
    Ok(shows)
}

pub async fn get_show(pool: &PgPool, show_id: i64) -> AppResult<Option<ShowSummary>> {
    let show = sqlx::query_as::<_, ShowSummary>(&format!(
        "{SUMMARY_SELECT} WHERE s.show_id = $1 GROUP BY s.show_id"
    ))
    .bind(show_id)
    .fetch_optional(pool)
    .await?;
    Ok(show)
}

pub async fn get_show_genres(pool: &PgPool, show_id: i64) -> AppResult<Vec<Genre>> {
    let genres = sqlx::query_as::<_, Genre>(
        r#"
        SELECT g.genre_id, g.name, g.description
        FROM genres g
        JOIN show_genres sg ON sg.genre_id = g.genre_id
        WHERE sg.show_id = $1
        ORDER BY g.name
        "#,
    )
    .bind(show_id)
    .fetch_all(pool)
    .await?;
    Ok(genres)
}

pub async fn get_show_reviews(pool: &PgPool, show_id: i64) -> AppResult<Vec<ReviewWithTitles>> {
    let reviews = sqlx::query_as::<_, ReviewWithTitles>(
        r#"
        SELECT r.review_id, r.user_id, r.movie_id, r.show_id, r.score, r.title, r.content,
               r.created_at, r.updated_at,
               u.name AS user_name, NULL::text AS movie_title, s.title AS show_title
        FROM reviews r
        JOIN users u ON u.user_id = r.user_id
        JOIN tv_shows s ON s.show_id = r.show_id
        WHERE r.show_id = $1
        ORDER BY r.created_at DESC, r.review_id DESC
        "#,
    )
    .bind(show_id)
    .fetch_all(pool)
    .await?;
    Ok(reviews)
}

/// Inserts a show and its genre links as one unit
pub async fn create_show_with_genres(pool: &PgPool, input: &ShowInput) -> AppResult<i64> {
    let mut tx = pool.begin().await?;

    let show_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO tv_shows (title, description, year, seasons, episodes, age_rating)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING show_id
        "#,
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(input.year)
    .bind(input.seasons)
    .bind(input.episodes)
    .bind(&input.age_rating)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO show_genres (show_id, genre_id)
        SELECT $1, g FROM UNNEST($2::bigint[]) AS g
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(show_id)
    .bind(&input.genre_ids)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(show_id, title = %input.title, "Show created");
    Ok(show_id)
}

/// Updates a show and replaces its genres; false when the show is gone
pub async fn update_show_with_genres(
    pool: &PgPool,
    show_id: i64,
    input: &ShowInput,
) -> AppResult<bool> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        r#"
        UPDATE tv_shows
        SET title = $1, description = $2, year = $3, seasons = $4, episodes = $5,
            age_rating = $6, updated_at = NOW()
        WHERE show_id = $7
        "#,
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(input.year)
    .bind(input.seasons)
    .bind(input.episodes)
    .bind(&input.age_rating)
    .bind(show_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated == 0 {
        return Ok(false);
    }

    sqlx::query("DELETE FROM show_genres WHERE show_id = $1")
        .bind(show_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO show_genres (show_id, genre_id)
        SELECT $1, g FROM UNNEST($2::bigint[]) AS g
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(show_id)
    .bind(&input.genre_ids)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(show_id, "Show updated");
    Ok(true)
}

pub async fn delete_show(pool: &PgPool, show_id: i64) -> AppResult<bool> {
    let deleted = sqlx::query("DELETE FROM tv_shows WHERE show_id = $1")
        .bind(show_id)
        .execute(pool)
        .await?
        .rows_affected();

    if deleted > 0 {
        tracing::info!(show_id, "Show deleted");
    }
    Ok(deleted > 0)
}
