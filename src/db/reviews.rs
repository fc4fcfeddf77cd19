use sqlx::PgPool;

use crate::{
    error::{AppError, AppResult},
    models::{ContentRef, Review, ReviewInput, ReviewWithTitles},
};

const WITH_TITLES_SELECT: &str = r#"
    SELECT r.review_id, r.user_id, r.movie_id, r.show_id, r.score, r.title, r.content,
           r.created_at, r.updated_at,
           u.name AS user_name, m.title AS movie_title, s.title AS show_title
    FROM reviews r
    JOIN users u ON u.user_id = r.user_id
    LEFT JOIN movies m ON m.movie_id = r.movie_id
    LEFT JOIN tv_shows s ON s.show_id = r.show_id
"#;

/// Creates a review for exactly one movie or show.
///
/// The target is checked inside the transaction; a second review by the
/// same user for the same target fails with [`AppError::Duplicate`] and
/// leaves the existing row untouched.
pub async fn create_review(
    pool: &PgPool,
    user_id: i64,
    target: ContentRef,
    input: &ReviewInput,
) -> AppResult<i64> {
    let mut tx = pool.begin().await?;

    let exists: bool = match target {
        ContentRef::Movie(id) => {
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM movies WHERE movie_id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?
        }
        ContentRef::Show(id) => {
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tv_shows WHERE show_id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?
        }
    };

    if !exists {
        return Err(AppError::NotFound(target.path()));
    }

    let review_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO reviews (user_id, movie_id, show_id, score, title, content)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING review_id
        "#,
    )
    .bind(user_id)
    .bind(target.movie_id())
    .bind(target.show_id())
    .bind(input.score)
    .bind(&input.title)
    .bind(&input.content)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(review_id, user_id, target = %target.kind(), "Review created");
    Ok(review_id)
}

pub async fn get_review(pool: &PgPool, review_id: i64) -> AppResult<Option<ReviewWithTitles>> {
    let review = sqlx::query_as::<_, ReviewWithTitles>(&format!(
        "{WITH_TITLES_SELECT} WHERE r.review_id = $1"
    ))
    .bind(review_id)
    .fetch_optional(pool)
    .await?;
    Ok(review)
}

/// Rewrites score, title and content; the target never changes
pub async fn update_review(pool: &PgPool, review_id: i64, input: &ReviewInput) -> AppResult<Review> {
    let review = sqlx::query_as::<_, Review>(
        r#"
        UPDATE reviews
        SET score = $1, title = $2, content = $3, updated_at = NOW()
        WHERE review_id = $4
        RETURNING review_id, user_id, movie_id, show_id, score, title, content,
                  created_at, updated_at
        "#,
    )
    .bind(input.score)
    .bind(&input.title)
    .bind(&input.content)
    .bind(review_id)
    .fetch_one(pool)
    .await?;

    tracing::info!(review_id, "Review updated");
    Ok(review)
}

pub async fn delete_review(pool: &PgPool, review_id: i64) -> AppResult<bool> {
    let deleted = sqlx::query("DELETE FROM reviews WHERE review_id = $1")
        .bind(review_id)
        .execute(pool)
        .await?
        .rows_affected();

    if deleted > 0 {
        tracing::info!(review_id, "Review deleted");
    }
    Ok(deleted > 0)
}

/// A user's reviews, newest first
pub async fn get_user_reviews(pool: &PgPool, user_id: i64) -> AppResult<Vec<ReviewWithTitles>> {
    let reviews = sqlx::query_as::<_, ReviewWithTitles>(&format!(
        "{WITH_TITLES_SELECT} WHERE r.user_id = $1 ORDER BY r.created_at DESC, r.review_id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(reviews)
}

/// Latest reviews across the site
pub async fn get_recent_reviews(pool: &PgPool, limit: i64) -> AppResult<Vec<ReviewWithTitles>> {
    let reviews = sqlx::query_as::<_, ReviewWithTitles>(&format!(
        "{WITH_TITLES_SELECT} ORDER BY r.created_at DESC, r.review_id DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(reviews)
}
