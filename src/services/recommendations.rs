use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use sqlx::PgPool;

use crate::{
    db,
    error::AppResult,
    models::{FriendLike, MovieCandidate, Recommendation},
};

/// A friend's review counts as a like at or above this score
pub const FRIEND_LIKE_THRESHOLD: f64 = 7.0;

/// Length of each list on the recommendations page
pub const DEFAULT_LIMIT: usize = 10;

/// Both recommendation lists for one viewer
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Recommendations {
    pub by_preference: Vec<Recommendation>,
    pub from_friends: Vec<Recommendation>,
}

/// Everything the two rankings read, fetched in one pass
#[derive(Debug, Clone, Default)]
pub struct RankingInputs {
    pub candidates: Vec<MovieCandidate>,
    pub preferences: HashMap<i64, f64>,
    pub reviewed: HashSet<i64>,
    pub friend_reviews: Vec<FriendLike>,
}

/// Generates both recommendation lists for a user.
///
/// Nothing is cached: every call reads the current reviews, friendships
/// and stored genre preferences and ranks from scratch.
pub async fn get_recommendations(
    pool: &PgPool,
    user_id: i64,
    limit: usize,
) -> AppResult<Recommendations> {
    let inputs = db::recommendations::load_ranking_inputs(pool, user_id).await?;

    tracing::debug!(
        user_id,
        candidates = inputs.candidates.len(),
        reviewed = inputs.reviewed.len(),
        friend_reviews = inputs.friend_reviews.len(),
        "Ranking recommendations"
    );

    Ok(Recommendations {
        by_preference: rank_by_preference(&inputs, limit),
        from_friends: rank_by_friend_activity(&inputs, limit),
    })
}

/// Unrated movies sort after rated ones, higher averages first
fn cmp_avg_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Ranks unreviewed movies by the viewer's strongest genre preference.
///
/// Order: preference score desc, average rating desc, review count desc,
/// movie id asc.
pub fn rank_by_preference(inputs: &RankingInputs, limit: usize) -> Vec<Recommendation> {
    let mut scored: Vec<(f64, &MovieCandidate)> = inputs
        .candidates
        .iter()
        .filter(|m| !inputs.reviewed.contains(&m.movie_id))
        .map(|m| {
            let score = m
                .genre_ids
                .iter()
                .filter_map(|g| inputs.preferences.get(g).copied())
                .fold(None, |best: Option<f64>, s| Some(best.map_or(s, |b| b.max(s))))
                .unwrap_or(0.0);
            (score, m)
        })
        .collect();

    scored.sort_by(|(sa, a), (sb, b)| {
        sb.total_cmp(sa)
            .then_with(|| cmp_avg_desc(a.avg_rating, b.avg_rating))
            .then_with(|| b.review_count.cmp(&a.review_count))
            .then_with(|| a.movie_id.cmp(&b.movie_id))
    });

    scored
        .into_iter()
        .take(limit)
        .map(|(score, m)| Recommendation {
            movie: m.clone(),
            max_preference_score: Some(score),
            friend_likes: None,
        })
        .collect()
}

/// Ranks unreviewed movies by how many distinct friends rated them
/// [`FRIEND_LIKE_THRESHOLD`] or higher.
///
/// Order: friend likes desc, average rating desc, movie id asc.
pub fn rank_by_friend_activity(inputs: &RankingInputs, limit: usize) -> Vec<Recommendation> {
    let mut likes: HashMap<i64, HashSet<i64>> = HashMap::new();
    for review in &inputs.friend_reviews {
        if review.score >= FRIEND_LIKE_THRESHOLD && !inputs.reviewed.contains(&review.movie_id) {
            likes
                .entry(review.movie_id)
                .or_default()
                .insert(review.friend_id);
        }
    }

    let mut ranked: Vec<(i64, &MovieCandidate)> = inputs
        .candidates
        .iter()
        .filter_map(|m| likes.get(&m.movie_id).map(|friends| (friends.len() as i64, m)))
        .collect();

    ranked.sort_by(|(la, a), (lb, b)| {
        lb.cmp(la)
            .then_with(|| cmp_avg_desc(a.avg_rating, b.avg_rating))
            .then_with(|| a.movie_id.cmp(&b.movie_id))
    });

    ranked
        .into_iter()
        .take(limit)
        .map(|(friend_likes, m)| Recommendation {
            movie: m.clone(),
            max_preference_score: None,
            friend_likes: Some(friend_likes),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: i64, avg: Option<f64>, count: i64, genres: &[i64]) -> MovieCandidate {
        MovieCandidate {
            movie_id: id,
            title: format!("Movie {id}"),
            description: None,
            year: Some(2000),
            length: None,
            age_rating: None,
            avg_rating: avg,
            review_count: count,
            genre_ids: genres.to_vec(),
        }
    }

    fn like(movie_id: i64, friend_id: i64, score: f64) -> FriendLike {
        FriendLike {
            movie_id,
            friend_id,
            score,
        }
    }

    fn ids(recs: &[Recommendation]) -> Vec<i64> {
        recs.iter().map(|r| r.movie.movie_id).collect()
    }

    #[test]
    fn test_preference_score_beats_average_rating() {
        let inputs = RankingInputs {
            candidates: vec![movie(1, Some(9.8), 50, &[20]), movie(2, Some(2.0), 1, &[10])],
            preferences: HashMap::from([(10, 5.0), (20, 3.0)]),
            ..Default::default()
        };

        let ranked = rank_by_preference(&inputs, 10);
        assert_eq!(ids(&ranked), vec![2, 1]);
        assert_eq!(ranked[0].max_preference_score, Some(5.0));
        assert_eq!(ranked[1].max_preference_score, Some(3.0));
    }

    #[test]
    fn test_preference_uses_max_over_genres_and_defaults_to_zero() {
        let inputs = RankingInputs {
            candidates: vec![movie(1, None, 0, &[1, 2, 3]), movie(2, None, 0, &[99])],
            preferences: HashMap::from([(1, 2.5), (2, 7.25), (3, 4.0)]),
            ..Default::default()
        };

        let ranked = rank_by_preference(&inputs, 10);
        assert_eq!(ranked[0].max_preference_score, Some(7.25));
        assert_eq!(ranked[1].max_preference_score, Some(0.0));
    }

    #[test]
    fn test_preference_tie_breaks() {
        let inputs = RankingInputs {
            candidates: vec![
                movie(1, Some(7.0), 3, &[]),
                movie(2, Some(8.0), 1, &[]),
                movie(3, Some(7.0), 9, &[]),
                movie(4, None, 0, &[]),
                movie(5, Some(7.0), 9, &[]),
            ],
            ..Default::default()
        };

        let ranked = rank_by_preference(&inputs, 10);
        assert_eq!(ids(&ranked), vec![2, 3, 5, 1, 4]);
    }

    #[test]
    fn test_reviewed_movies_never_recommended() {
        let inputs = RankingInputs {
            candidates: vec![movie(1, Some(9.0), 4, &[1]), movie(2, Some(5.0), 1, &[1])],
            preferences: HashMap::from([(1, 9.0)]),
            reviewed: HashSet::from([1]),
            friend_reviews: vec![like(1, 50, 10.0), like(2, 50, 8.0)],
        };

        assert_eq!(ids(&rank_by_preference(&inputs, 10)), vec![2]);
        assert_eq!(ids(&rank_by_friend_activity(&inputs, 10)), vec![2]);
    }

    #[test]
    fn test_limit_truncates() {
        let inputs = RankingInputs {
            candidates: (1..=20).map(|id| movie(id, None, 0, &[])).collect(),
            ..Default::default()
        };
        assert_eq!(rank_by_preference(&inputs, 3).len(), 3);
        assert!(rank_by_preference(&inputs, 0).is_empty());
    }

    #[test]
    fn test_friend_likes_threshold() {
        let inputs = RankingInputs {
            candidates: vec![movie(1, Some(6.0), 2, &[]), movie(2, Some(6.0), 2, &[])],
            friend_reviews: vec![like(1, 50, 7.0), like(2, 50, 6.9), like(2, 51, 6.99)],
            ..Default::default()
        };

        let ranked = rank_by_friend_activity(&inputs, 10);
        assert_eq!(ids(&ranked), vec![1]);
        assert_eq!(ranked[0].friend_likes, Some(1));
    }

    #[test]
    fn test_friend_likes_count_distinct_friends() {
        let inputs = RankingInputs {
            candidates: vec![movie(1, Some(9.5), 5, &[]), movie(2, Some(6.0), 5, &[])],
            friend_reviews: vec![
                like(1, 50, 9.0),
                like(1, 50, 9.5),
                like(2, 50, 7.5),
                like(2, 51, 8.0),
            ],
            ..Default::default()
        };

        let ranked = rank_by_friend_activity(&inputs, 10);
        assert_eq!(ids(&ranked), vec![2, 1]);
        assert_eq!(ranked[0].friend_likes, Some(2));
        assert_eq!(ranked[1].friend_likes, Some(1));
    }

    #[test]
    fn test_friend_ties_broken_by_average() {
        let inputs = RankingInputs {
            candidates: vec![
                movie(1, Some(7.5), 2, &[]),
                movie(2, Some(8.5), 2, &[]),
                movie(3, None, 0, &[]),
            ],
            friend_reviews: vec![like(1, 50, 8.0), like(2, 50, 8.0), like(3, 50, 8.0)],
            ..Default::default()
        };

        assert_eq!(ids(&rank_by_friend_activity(&inputs, 10)), vec![2, 1, 3]);
    }

    #[test]
    fn test_rankings_are_deterministic() {
        let inputs = RankingInputs {
            candidates: (1..=8).rev().map(|id| movie(id, Some(5.0), 1, &[1])).collect(),
            preferences: HashMap::from([(1, 4.0)]),
            friend_reviews: (1..=8).map(|id| like(id, 70, 8.0)).collect(),
            ..Default::default()
        };

        let first = rank_by_preference(&inputs, 5);
        let second = rank_by_preference(&inputs, 5);
        assert_eq!(first, second);
        assert_eq!(ids(&first), vec![1, 2, 3, 4, 5]);
        assert_eq!(ids(&rank_by_friend_activity(&inputs, 5)), vec![1, 2, 3, 4, 5]);
    }
}
