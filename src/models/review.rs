use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{non_blank, parse_opt, ContentKind};
use crate::error::AppError;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// The single content item a review is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ContentRef {
    Movie(i64),
    Show(i64),
}

impl ContentRef {
    /// Exactly one of the two ids must be present
    pub fn from_ids(movie_id: Option<i64>, show_id: Option<i64>) -> Result<Self, AppError> {
        match (movie_id, show_id) {
            (Some(movie_id), None) => Ok(ContentRef::Movie(movie_id)),
            (None, Some(show_id)) => Ok(ContentRef::Show(show_id)),
            (Some(_), Some(_)) => Err(AppError::InvalidInput(
                "Please review either a movie or a show, not both.".to_string(),
            )),
            (None, None) => Err(AppError::InvalidInput(
                "Please select a movie or show to review.".to_string(),
            )),
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            ContentRef::Movie(_) => ContentKind::Movie,
            ContentRef::Show(_) => ContentKind::Show,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            ContentRef::Movie(id) | ContentRef::Show(id) => *id,
        }
    }

    pub fn movie_id(&self) -> Option<i64> {
        match self {
            ContentRef::Movie(id) => Some(*id),
            ContentRef::Show(_) => None,
        }
    }

    pub fn show_id(&self) -> Option<i64> {
        match self {
            ContentRef::Show(id) => Some(*id),
            ContentRef::Movie(_) => None,
        }
    }

    /// Detail page of the content item
    pub fn path(&self) -> String {
        match self {
            ContentRef::Movie(id) => format!("/movie/{}", id),
            ContentRef::Show(id) => format!("/show/{}", id),
        }
    }
}

/// A row of the `reviews` table
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    pub review_id: i64,
    pub user_id: i64,
    pub movie_id: Option<i64>,
    pub show_id: Option<i64>,
    pub score: f64,
    pub title: String,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    pub fn target(&self) -> Option<ContentRef> {
        ContentRef::from_ids(self.movie_id, self.show_id).ok()
    }
}

/// A review joined with its author's name and the reviewed item's title
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReviewWithTitles {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub review: Review,
    pub user_name: Option<String>,
    pub movie_title: Option<String>,
    pub show_title: Option<String>,
}

/// Raw review form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewForm {
    pub score: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub movie_id: Option<String>,
    pub show_id: Option<String>,
}

/// Validated review body
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewInput {
    pub score: f64,
    pub title: String,
    pub content: Option<String>,
}

impl ReviewForm {
    /// Resolves the review target; malformed ids count as absent
    pub fn target(&self) -> Result<ContentRef, AppError> {
        ContentRef::from_ids(
            parse_opt(self.movie_id.as_deref()),
            parse_opt(self.show_id.as_deref()),
        )
    }

    /// Validates score and title
    pub fn body(self) -> Result<ReviewInput, AppError> {
        let score = parse_opt::<f64>(self.score.as_deref()).filter(|s| s.is_finite());
        let title = non_blank(self.title);

        let (Some(score), Some(title)) = (score, title) else {
            return Err(AppError::InvalidInput(
                "Please fill in all required fields.".to_string(),
            ));
        };

        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(AppError::InvalidInput(
                "Score must be between 0 and 10.".to_string(),
            ));
        }

        Ok(ReviewInput {
            score,
            title,
            content: non_blank(self.content),
        })
    }

    /// Full validation for a new review
    pub fn validate(self) -> Result<(ContentRef, ReviewInput), AppError> {
        let target = self.target()?;
        let body = self.body()?;
        Ok((target, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(score: &str, movie: Option<&str>, show: Option<&str>) -> ReviewForm {
        ReviewForm {
            score: Some(score.into()),
            title: Some("Loved it".into()),
            content: Some("".into()),
            movie_id: movie.map(Into::into),
            show_id: show.map(Into::into),
        }
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::InvalidInput(msg) => msg,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_valid_movie_review() {
        let (target, body) = form("8.5", Some("3"), None).validate().unwrap();
        assert_eq!(target, ContentRef::Movie(3));
        assert_eq!(body.score, 8.5);
        assert_eq!(body.content, None);
    }

    #[test]
    fn test_zero_score_is_valid() {
        let (_, body) = form("0", None, Some("2")).validate().unwrap();
        assert_eq!(body.score, 0.0);
    }

    #[test]
    fn test_score_out_of_range() {
        for score in ["11", "-0.5", "10.01"] {
            let err = form(score, Some("1"), None).validate().unwrap_err();
            assert_eq!(message(err), "Score must be between 0 and 10.");
        }
    }

    #[test]
    fn test_non_numeric_score() {
        for score in ["great", "NaN", ""] {
            let err = form(score, Some("1"), None).validate().unwrap_err();
            assert_eq!(message(err), "Please fill in all required fields.");
        }
    }

    #[test]
    fn test_both_targets_rejected() {
        let err = form("7", Some("1"), Some("2")).validate().unwrap_err();
        assert_eq!(message(err), "Please review either a movie or a show, not both.");
    }

    #[test]
    fn test_missing_target_rejected() {
        let err = form("7", None, Some("abc")).validate().unwrap_err();
        assert_eq!(message(err), "Please select a movie or show to review.");
    }

    #[test]
    fn test_content_ref_paths() {
        assert_eq!(ContentRef::Movie(4).path(), "/movie/4");
        assert_eq!(ContentRef::Show(9).path(), "/show/9");
        assert_eq!(ContentRef::Show(9).movie_id(), None);
        assert_eq!(ContentRef::Show(9).id(), 9);
        assert_eq!(ContentRef::Show(9).kind(), ContentKind::Show);
    }
}
