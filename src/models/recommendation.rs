use serde::Serialize;

/// A movie the viewer has not reviewed yet, with the signals used to rank it
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct MovieCandidate {
    pub movie_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub length: Option<i32>,
    pub age_rating: Option<String>,
    pub avg_rating: Option<f64>,
    pub review_count: i64,
    #[serde(skip_serializing)]
    pub genre_ids: Vec<i64>,
}

/// One friend's review of a candidate movie
#[derive(Debug, Clone, Copy, PartialEq, sqlx::FromRow)]
pub struct FriendLike {
    pub movie_id: i64,
    pub friend_id: i64,
    pub score: f64,
}

/// A genre with the viewer's preference weight, if one was computed
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct GenrePreference {
    pub genre_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub preference_score: Option<f64>,
}

/// A ranked recommendation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub movie: MovieCandidate,
    /// Highest preference weight among the movie's genres
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_preference_score: Option<f64>,
    /// Distinct friends who rated the movie 7.0 or higher
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friend_likes: Option<i64>,
}
