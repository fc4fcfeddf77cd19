use std::collections::{HashMap, HashSet};

use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{FriendLike, MovieCandidate},
    services::recommendations::{RankingInputs, FRIEND_LIKE_THRESHOLD},
};

/// Loads the signals both rankings read for `user_id`.
///
/// Candidates are movies the user has not reviewed; friend reviews are
/// already restricted to likes at or above the threshold.
pub async fn load_ranking_inputs(pool: &PgPool, user_id: i64) -> AppResult<RankingInputs> {
    let candidates = sqlx::query_as::<_, MovieCandidate>(
        r#"
        SELECT m.movie_id, m.title, m.description, m.year, m.length, m.age_rating,
               stats.avg_rating, COALESCE(stats.review_count, 0) AS review_count,
               COALESCE(
                   (SELECT ARRAY_AGG(mg.genre_id) FROM movie_genres mg WHERE mg.movie_id = m.movie_id),
                   ARRAY[]::bigint[]
               ) AS genre_ids
        FROM movies m
        LEFT JOIN (
            SELECT movie_id, COUNT(*) AS review_count,
                   ROUND(AVG(score)::numeric, 2)::float8 AS avg_rating
            FROM reviews
            WHERE movie_id IS NOT NULL
            GROUP BY movie_id
        ) AS stats ON stats.movie_id = m.movie_id
        WHERE NOT EXISTS (
            SELECT 1 FROM reviews own WHERE own.user_id = $1 AND own.movie_id = m.movie_id
        )
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let preferences: Vec<(i64, f64)> = sqlx::query_as(
        "SELECT genre_id, preference_score FROM user_preferences WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let reviewed: Vec<i64> = sqlx::query_scalar(
        "SELECT movie_id FROM reviews WHERE user_id = $1 AND movie_id IS NOT NULL",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let friend_reviews = sqlx::query_as::<_, FriendLike>(
        r#"
        SELECT r.movie_id, r.user_id AS friend_id, r.score
        FROM reviews r
        JOIN friends f
          ON (f.user_id1 = $1 AND f.user_id2 = r.user_id)
          OR (f.user_id2 = $1 AND f.user_id1 = r.user_id)
        WHERE r.movie_id IS NOT NULL AND r.score >= $2
        "#,
    )
    .bind(user_id)
    .bind(FRIEND_LIKE_THRESHOLD)
    .fetch_all(pool)
    .await?;

    Ok(RankingInputs {
        candidates,
        preferences: preferences.into_iter().collect::<HashMap<_, _>>(),
        reviewed: reviewed.into_iter().collect::<HashSet<_>>(),
        friend_reviews,
    })
}
