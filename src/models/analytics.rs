use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ContentKind;

/// Movies and shows ranked together by `review_count × average`
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PopularItem {
    pub content_id: i64,
    #[sqlx(try_from = "String")]
    pub content_type: ContentKind,
    pub title: String,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub age_rating: Option<String>,
    pub review_count: i64,
    pub average_rating: Option<f64>,
    pub popularity_score: f64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TopRatedItem {
    pub content_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub age_rating: Option<String>,
    pub review_count: i64,
    pub average_rating: f64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ActiveUser {
    pub user_id: i64,
    pub name: String,
    pub review_count: i64,
    pub friend_count: i64,
    pub avg_score: Option<f64>,
    pub last_review_at: Option<DateTime<Utc>>,
}

/// How closely two friends' review histories agree
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FriendshipSimilarity {
    pub user_id1: i64,
    pub user_name1: String,
    pub user_id2: i64,
    pub user_name2: String,
    pub common_items: i64,
    pub avg_score_difference: Option<f64>,
    pub similarity_score: f64,
}

/// Rating distribution for one movie or show
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RatingStats {
    pub total_reviews: i64,
    pub average_rating: Option<f64>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub rating_stddev: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, sqlx::FromRow)]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_movies: i64,
    pub total_shows: i64,
    pub total_reviews: i64,
    pub total_friendships: i64,
}
