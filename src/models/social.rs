use chrono::{DateTime, Utc};
use serde::Serialize;

use super::user::Role;

/// A user seen from the other side of a friendship
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Friend {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub friendship_date: DateTime<Utc>,
}

/// Minimal user row for pickers
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserListing {
    pub user_id: i64,
    pub name: String,
    pub email: String,
}

/// Orders a pair so both orientations of a friendship compare equal
pub fn unordered_pair(a: i64, b: i64) -> (i64, i64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
