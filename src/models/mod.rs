pub mod analytics;
pub mod catalog;
pub mod recommendation;
pub mod review;
pub mod social;
pub mod user;

pub use analytics::{
    ActiveUser, DashboardStats, FriendshipSimilarity, PopularItem, RatingStats, TopRatedItem,
};
pub use catalog::{
    CatalogFilter, Celebrity, CelebrityInput, CompanyInput, Credit, CreditLink, Genre, GenreInput,
    Movie, MovieInput, MovieSummary, ProductionCompany, Show, ShowInput, ShowSummary,
};
pub use recommendation::{FriendLike, GenrePreference, MovieCandidate, Recommendation};
pub use review::{ContentRef, Review, ReviewForm, ReviewInput, ReviewWithTitles};
pub use social::{Friend, UserListing};
pub use user::{NewUser, RegistrationForm, Role, User, UserStats, VerifiedEntity};

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Kind of content item a review or listing row refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Movie,
    Show,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Movie => "movie",
            ContentKind::Show => "show",
        }
    }
}

impl Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ContentKind {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "movie" => Ok(ContentKind::Movie),
            "show" => Ok(ContentKind::Show),
            _ => Err(UnknownVariant(value)),
        }
    }
}

/// A stored string that does not name a known enum variant
#[derive(Debug, thiserror::Error)]
#[error("unknown variant {0:?}")]
pub struct UnknownVariant(pub String);

/// Trims a form field, mapping blank input to `None`
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses an optional integer form field; blank or malformed input is `None`
pub(crate) fn parse_opt<T: std::str::FromStr>(value: Option<&str>) -> Option<T> {
    value.map(str::trim).filter(|v| !v.is_empty()).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_kind_round_trip_from_db_text() {
        assert_eq!(ContentKind::try_from("movie".to_string()).unwrap(), ContentKind::Movie);
        assert_eq!(ContentKind::try_from("show".to_string()).unwrap(), ContentKind::Show);
        assert!(ContentKind::try_from("podcast".to_string()).is_err());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  Dune ".into())), Some("Dune".to_string()));
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn test_parse_opt() {
        assert_eq!(parse_opt::<i32>(Some(" 42 ")), Some(42));
        assert_eq!(parse_opt::<i32>(Some("forty")), None);
        assert_eq!(parse_opt::<i32>(Some("")), None);
        assert_eq!(parse_opt::<i32>(None), None);
    }
}
