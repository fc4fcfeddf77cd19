use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{
        ActiveUser, ContentKind, DashboardStats, FriendshipSimilarity, PopularItem, RatingStats,
        TopRatedItem,
    },
};

/// Minimum reviews before an item qualifies for the top-rated lists
pub const TOP_RATED_MIN_REVIEWS: i64 = 2;

const POPULAR_LIMIT: i64 = 20;
const TOP_RATED_LIMIT: i64 = 20;
const ACTIVE_USERS_LIMIT: i64 = 20;
const SIMILARITY_LIMIT: i64 = 50;

/// Movies and shows together, by `review_count × average`
pub async fn get_popular_content(pool: &PgPool) -> AppResult<Vec<PopularItem>> {
    let items = sqlx::query_as::<_, PopularItem>(
        r#"
        SELECT * FROM (
            SELECT m.movie_id AS content_id, 'movie' AS content_type, m.title, m.description,
                   m.year, m.age_rating,
                   COUNT(r.review_id) AS review_count,
                   ROUND(AVG(r.score)::numeric, 2)::float8 AS average_rating,
                   ROUND((COUNT(r.review_id) * COALESCE(AVG(r.score), 0))::numeric, 2)::float8
                       AS popularity_score
            FROM movies m
            LEFT JOIN reviews r ON r.movie_id = m.movie_id
            GROUP BY m.movie_id
            UNION ALL
            SELECT s.show_id, 'show', s.title, s.description, s.year, s.age_rating,
                   COUNT(r.review_id),
                   ROUND(AVG(r.score)::numeric, 2)::float8,
                   ROUND((COUNT(r.review_id) * COALESCE(AVG(r.score), 0))::numeric, 2)::float8
            FROM tv_shows s
            LEFT JOIN reviews r ON r.show_id = s.show_id
            GROUP BY s.show_id
        ) AS combined
        ORDER BY popularity_score DESC, title, content_id
        LIMIT $1
        "#,
    )
    .bind(POPULAR_LIMIT)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

/// Best average first, among items with at least
/// [`TOP_RATED_MIN_REVIEWS`] reviews
pub async fn get_top_rated(pool: &PgPool, kind: ContentKind) -> AppResult<Vec<TopRatedItem>> {
    let (table, id_column) = match kind {
        ContentKind::Movie => ("movies", "movie_id"),
        ContentKind::Show => ("tv_shows", "show_id"),
    };

    let items = sqlx::query_as::<_, TopRatedItem>(&format!(
        r#"
        SELECT c.{id_column} AS content_id, c.title, c.description, c.year, c.age_rating,
               COUNT(r.review_id) AS review_count,
               ROUND(AVG(r.score)::numeric, 2)::float8 AS average_rating
        FROM {table} c
        JOIN reviews r ON r.{id_column} = c.{id_column}
        GROUP BY c.{id_column}
        HAVING COUNT(r.review_id) >= $1
        ORDER BY average_rating DESC, review_count DESC, c.title
        LIMIT $2
        "#
    ))
    .bind(TOP_RATED_MIN_REVIEWS)
    .bind(TOP_RATED_LIMIT)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

/// Users with at least one review, most prolific first
pub async fn get_active_users(pool: &PgPool) -> AppResult<Vec<ActiveUser>> {
    let users = sqlx::query_as::<_, ActiveUser>(
        r#"
        SELECT u.user_id, u.name,
               COUNT(r.review_id) AS review_count,
               (SELECT COUNT(*) FROM friends f
                WHERE f.user_id1 = u.user_id OR f.user_id2 = u.user_id) AS friend_count,
               ROUND(AVG(r.score)::numeric, 2)::float8 AS avg_score,
               MAX(r.created_at) AS last_review_at
        FROM users u
        JOIN reviews r ON r.user_id = u.user_id
        GROUP BY u.user_id
        ORDER BY review_count DESC, last_review_at DESC, u.user_id
        LIMIT $1
        "#,
    )
    .bind(ACTIVE_USERS_LIMIT)
    .fetch_all(pool)
    .await?;
    Ok(users)
}

/// Agreement between friends over content both reviewed.
///
/// `similarity_score = common_items × (10 − avg |difference|) / 10`,
/// zero for pairs with nothing in common.
pub async fn get_friendship_similarity(pool: &PgPool) -> AppResult<Vec<FriendshipSimilarity>> {
    let pairs = sqlx::query_as::<_, FriendshipSimilarity>(
        r#"
        SELECT f.user_id1, u1.name AS user_name1, f.user_id2, u2.name AS user_name2,
               COUNT(r2.review_id) AS common_items,
               ROUND(AVG(ABS(r1.score - r2.score))::numeric, 2)::float8 AS avg_score_difference,
               COALESCE(
                   ROUND((COUNT(r2.review_id) * (10 - AVG(ABS(r1.score - r2.score))) / 10)::numeric, 2)::float8,
                   0
               ) AS similarity_score
        FROM friends f
        JOIN users u1 ON u1.user_id = f.user_id1
        JOIN users u2 ON u2.user_id = f.user_id2
        LEFT JOIN reviews r1 ON r1.user_id = f.user_id1
        LEFT JOIN reviews r2
          ON r2.user_id = f.user_id2
         AND (r2.movie_id = r1.movie_id OR r2.show_id = r1.show_id)
        GROUP BY f.user_id1, u1.name, f.user_id2, u2.name
        ORDER BY similarity_score DESC, common_items DESC, f.user_id1, f.user_id2
        LIMIT $1
        "#,
    )
    .bind(SIMILARITY_LIMIT)
    .fetch_all(pool)
    .await?;
    Ok(pairs)
}

/// Rating distribution for one movie or show; population stddev
pub async fn get_rating_stats(
    pool: &PgPool,
    kind: ContentKind,
    content_id: i64,
) -> AppResult<RatingStats> {
    let column = match kind {
        ContentKind::Movie => "movie_id",
        ContentKind::Show => "show_id",
    };

    let stats = sqlx::query_as::<_, RatingStats>(&format!(
        r#"
        SELECT COUNT(*) AS total_reviews,
               ROUND(AVG(score)::numeric, 2)::float8 AS average_rating,
               MIN(score) AS min_rating,
               MAX(score) AS max_rating,
               ROUND(STDDEV_POP(score)::numeric, 2)::float8 AS rating_stddev
        FROM reviews
        WHERE {column} = $1
        "#
    ))
    .bind(content_id)
    .fetch_one(pool)
    .await?;
    Ok(stats)
}

pub async fn get_dashboard_stats(pool: &PgPool) -> AppResult<DashboardStats> {
    let stats = sqlx::query_as::<_, DashboardStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users) AS total_users,
            (SELECT COUNT(*) FROM movies) AS total_movies,
            (SELECT COUNT(*) FROM tv_shows) AS total_shows,
            (SELECT COUNT(*) FROM reviews) AS total_reviews,
            (SELECT COUNT(*) FROM friends) AS total_friendships
        "#,
    )
    .fetch_one(pool)
    .await?;
    Ok(stats)
}
