use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{non_blank, parse_opt};
use crate::error::AppError;

pub const MIN_RELEASE_YEAR: i32 = 1888;
pub const MAX_RELEASE_YEAR: i32 = 2030;

/// A row of the `movies` table
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Movie {
    pub movie_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub length: Option<i32>,
    pub age_rating: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A movie annotated with its review aggregates
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MovieSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub movie: Movie,
    pub review_count: i64,
    pub avg_rating: Option<f64>,
}

impl MovieSummary {
    /// Detail-page popularity: review volume weighted over average score
    pub fn popularity_score(&self) -> Option<f64> {
        self.avg_rating
            .map(|avg| self.review_count as f64 * 0.7 + avg * 0.3)
    }
}

/// A row of the `tv_shows` table
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Show {
    pub show_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub seasons: Option<i32>,
    pub episodes: Option<i32>,
    pub age_rating: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A show annotated with its review aggregates
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ShowSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub show: Show,
    pub review_count: i64,
    pub avg_rating: Option<f64>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Genre {
    pub genre_id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Celebrity {
    pub celebrity_id: i64,
    pub name: String,
    pub birth_year: Option<i32>,
    pub nationality: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductionCompany {
    pub company_id: i64,
    pub name: String,
    pub founded_year: Option<i32>,
    pub country: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A credited link between a movie and a person or company.
///
/// On a movie page `id`/`name` describe the celebrity or company; on a
/// celebrity or company page they describe the movie.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Credit {
    pub id: i64,
    pub name: String,
    pub role: String,
}

/// One `id:Role` entry of a posted credit list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreditLink {
    pub id: i64,
    pub role: String,
}

impl CreditLink {
    /// Parses `"3:Director, 8:Lead Actor"`; entries may also be newline
    /// separated and the role may be omitted.
    pub fn parse_list(raw: Option<&str>, what: &str) -> Result<Vec<CreditLink>, AppError> {
        let Some(raw) = raw else {
            return Ok(Vec::new());
        };

        raw.split(|c: char| c == ',' || c == '\n')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (id, role) = entry.split_once(':').unwrap_or((entry, ""));
                let id = id.trim().parse::<i64>().map_err(|_| {
                    AppError::InvalidInput(format!("Invalid {} entry: {:?}", what, entry))
                })?;
                Ok(CreditLink {
                    id,
                    role: role.trim().to_string(),
                })
            })
            .collect()
    }

    /// Renders links back into the form's text representation
    pub fn format_list(credits: &[Credit]) -> String {
        credits
            .iter()
            .map(|c| {
                if c.role.is_empty() {
                    c.id.to_string()
                } else {
                    format!("{}:{}", c.id, c.role)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Optional genre and title filters for catalog listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFilter {
    pub genre: Option<i64>,
    pub q: Option<String>,
}

impl CatalogFilter {
    pub fn from_query(genre: Option<&str>, q: Option<&str>) -> Self {
        Self {
            genre: parse_opt(genre),
            q: non_blank(q.map(str::to_string)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.genre.is_none() && self.q.is_none()
    }

    /// `ILIKE` pattern for the title search, wildcards in the input escaped
    pub fn title_pattern(&self) -> Option<String> {
        self.q.as_deref().map(like_pattern)
    }
}

/// Builds a substring `LIKE` pattern that matches `needle` literally
pub fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn form_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn form_values(pairs: &[(String, String)], key: &str) -> Vec<i64> {
    pairs
        .iter()
        .filter(|(k, _)| k == key)
        .filter_map(|(_, v)| v.trim().parse().ok())
        .collect()
}

fn text(pairs: &[(String, String)], key: &str) -> Option<String> {
    non_blank(form_value(pairs, key).map(str::to_string))
}

fn title_and_year(pairs: &[(String, String)]) -> Result<(String, i32), AppError> {
    let title = text(pairs, "title");
    let year = parse_opt::<i32>(form_value(pairs, "year"));

    let (Some(title), Some(year)) = (title, year) else {
        return Err(AppError::InvalidInput("Title and year are required.".to_string()));
    };

    if !(MIN_RELEASE_YEAR..=MAX_RELEASE_YEAR).contains(&year) {
        return Err(AppError::InvalidInput(format!(
            "Year must be between {} and {}.",
            MIN_RELEASE_YEAR, MAX_RELEASE_YEAR
        )));
    }

    Ok((title, year))
}

/// Validated movie form including genre and credit links
#[derive(Debug, Clone, PartialEq)]
pub struct MovieInput {
    pub title: String,
    pub description: Option<String>,
    pub year: i32,
    pub length: Option<i32>,
    pub age_rating: Option<String>,
    pub genre_ids: Vec<i64>,
    pub cast: Vec<CreditLink>,
    pub production: Vec<CreditLink>,
}

impl MovieInput {
    /// Builds the input from raw urlencoded pairs; `genres` may repeat
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, AppError> {
        let (title, year) = title_and_year(pairs)?;

        Ok(Self {
            title,
            description: text(pairs, "description"),
            year,
            length: parse_opt(form_value(pairs, "length")),
            age_rating: text(pairs, "age_rating"),
            genre_ids: form_values(pairs, "genres"),
            cast: CreditLink::parse_list(form_value(pairs, "celebrity_data"), "cast")?,
            production: CreditLink::parse_list(
                form_value(pairs, "production_data"),
                "production",
            )?,
        })
    }
}

/// Validated show form
#[derive(Debug, Clone, PartialEq)]
pub struct ShowInput {
    pub title: String,
    pub description: Option<String>,
    pub year: i32,
    pub seasons: Option<i32>,
    pub episodes: Option<i32>,
    pub age_rating: Option<String>,
    pub genre_ids: Vec<i64>,
}

impl ShowInput {
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, AppError> {
        let (title, year) = title_and_year(pairs)?;

        Ok(Self {
            title,
            description: text(pairs, "description"),
            year,
            seasons: parse_opt(form_value(pairs, "seasons")),
            episodes: parse_opt(form_value(pairs, "episodes")),
            age_rating: text(pairs, "age_rating"),
            genre_ids: form_values(pairs, "genres"),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenreInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl GenreInput {
    pub fn validate(self) -> Result<(String, Option<String>), AppError> {
        let name = non_blank(self.name)
            .ok_or_else(|| AppError::InvalidInput("Genre name is required.".to_string()))?;
        Ok((name, non_blank(self.description)))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CelebrityInput {
    pub name: Option<String>,
    pub birth_year: Option<String>,
    pub nationality: Option<String>,
    pub bio: Option<String>,
}

/// A celebrity record ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct CelebrityRecord {
    pub name: String,
    pub birth_year: i32,
    pub nationality: Option<String>,
    pub bio: Option<String>,
}

impl CelebrityInput {
    pub fn validate(self) -> Result<CelebrityRecord, AppError> {
        let name = non_blank(self.name);
        let birth_year = parse_opt::<i32>(self.birth_year.as_deref());
        let (Some(name), Some(birth_year)) = (name, birth_year) else {
            return Err(AppError::InvalidInput(
                "Name and birth year are required.".to_string(),
            ));
        };
        Ok(CelebrityRecord {
            name,
            birth_year,
            nationality: non_blank(self.nationality),
            bio: non_blank(self.bio),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyInput {
    pub name: Option<String>,
    pub founded_year: Option<String>,
    pub country: Option<String>,
    pub description: Option<String>,
}

/// A production company record ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyRecord {
    pub name: String,
    pub founded_year: Option<i32>,
    pub country: Option<String>,
    pub description: Option<String>,
}

impl CompanyInput {
    pub fn validate(self) -> Result<CompanyRecord, AppError> {
        let name = non_blank(self.name)
            .ok_or_else(|| AppError::InvalidInput("Company name is required.".to_string()))?;
        Ok(CompanyRecord {
            name,
            founded_year: parse_opt(self.founded_year.as_deref()),
            country: non_blank(self.country),
            description: non_blank(self.description),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_movie_input_with_repeated_genres_and_credits() {
        let form = pairs(&[
            ("title", "Arrival"),
            ("year", "2016"),
            ("length", "116"),
            ("genres", "3"),
            ("genres", "7"),
            ("celebrity_data", "12:Director, 40:Lead"),
            ("production_data", "2:Distributor\n5"),
        ]);

        let input = MovieInput::from_pairs(&form).unwrap();
        assert_eq!(input.title, "Arrival");
        assert_eq!(input.year, 2016);
        assert_eq!(input.length, Some(116));
        assert_eq!(input.genre_ids, vec![3, 7]);
        assert_eq!(
            input.cast,
            vec![
                CreditLink { id: 12, role: "Director".into() },
                CreditLink { id: 40, role: "Lead".into() },
            ]
        );
        assert_eq!(
            input.production,
            vec![
                CreditLink { id: 2, role: "Distributor".into() },
                CreditLink { id: 5, role: String::new() },
            ]
        );
    }

    #[test]
    fn test_movie_requires_title_and_year() {
        let err = MovieInput::from_pairs(&pairs(&[("title", "Arrival")])).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(msg) if msg == "Title and year are required."));
    }

    #[test]
    fn test_year_bounds() {
        let err = ShowInput::from_pairs(&pairs(&[("title", "Old"), ("year", "1887")])).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(msg) if msg == "Year must be between 1888 and 2030."));

        let show = ShowInput::from_pairs(&pairs(&[("title", "Edge"), ("year", "1888")])).unwrap();
        assert_eq!(show.year, 1888);
    }

    #[test]
    fn test_bad_credit_entry() {
        let result = CreditLink::parse_list(Some("abc:Director"), "cast");
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_credit_format_round_trip() {
        let credits = vec![
            Credit { id: 1, name: "A".into(), role: "Director".into() },
            Credit { id: 2, name: "B".into(), role: String::new() },
        ];
        let text = CreditLink::format_list(&credits);
        assert_eq!(text, "1:Director, 2");
        assert_eq!(CreditLink::parse_list(Some(&text), "cast").unwrap().len(), 2);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Dune"), "%Dune%");
        assert_eq!(like_pattern("100%_"), "%100\\%\\_%");
    }

    #[test]
    fn test_catalog_filter_from_query() {
        let filter = CatalogFilter::from_query(Some("4"), Some("  "));
        assert_eq!(filter.genre, Some(4));
        assert_eq!(filter.q, None);
        assert!(!filter.is_empty());

        assert!(CatalogFilter::from_query(Some(""), None).is_empty());
    }

    #[test]
    fn test_celebrity_requires_birth_year() {
        let input = CelebrityInput {
            name: Some("Amy Adams".into()),
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_company_founded_year_optional() {
        let record = CompanyInput {
            name: Some("A24".into()),
            founded_year: Some("".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(record.founded_year, None);
    }
}
