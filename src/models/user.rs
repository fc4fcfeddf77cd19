use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{non_blank, parse_opt, UnknownVariant};
use crate::error::AppError;

pub const MIN_AGE: i32 = 13;
pub const MAX_AGE: i32 = 120;

/// Account role; every user has exactly one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    NormalUser,
    VerifiedUser,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::NormalUser => "normal_user",
            Role::VerifiedUser => "verified_user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "normal_user" => Some(Role::NormalUser),
            "verified_user" => Some(Role::VerifiedUser),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Role::parse(&value).ok_or(UnknownVariant(value))
    }
}

/// The celebrity or production company a verified account speaks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum VerifiedEntity {
    Celebrity(i64),
    Company(i64),
}

impl VerifiedEntity {
    pub fn from_parts(entity_type: Option<&str>, entity_id: Option<i64>) -> Option<Self> {
        match (entity_type?, entity_id?) {
            ("celebrity", id) => Some(VerifiedEntity::Celebrity(id)),
            ("company", id) => Some(VerifiedEntity::Company(id)),
            _ => None,
        }
    }

    pub fn type_str(&self) -> &'static str {
        match self {
            VerifiedEntity::Celebrity(_) => "celebrity",
            VerifiedEntity::Company(_) => "company",
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            VerifiedEntity::Celebrity(id) | VerifiedEntity::Company(id) => *id,
        }
    }
}

/// A row of the `users` table
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub verified_entity_type: Option<String>,
    pub verified_entity_id: Option<i64>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn verified_entity(&self) -> Option<VerifiedEntity> {
        VerifiedEntity::from_parts(self.verified_entity_type.as_deref(), self.verified_entity_id)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Profile counters shown on the profile page
#[derive(Debug, Clone, Default, Serialize, sqlx::FromRow)]
pub struct UserStats {
    pub review_count: i64,
    pub friend_count: i64,
    pub avg_score: Option<f64>,
}

/// A validated registration, password still in plain text
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub verified_entity: Option<VerifiedEntity>,
}

/// Raw registration form; every field arrives as optional text
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
    pub age: Option<String>,
    pub gender: Option<String>,
    pub role: Option<String>,
    pub verified_entity_type: Option<String>,
    pub verified_entity_id: Option<String>,
}

impl RegistrationForm {
    /// Validates the form without touching the database
    pub fn validate(self) -> Result<NewUser, AppError> {
        let name = non_blank(self.name);
        let email = non_blank(self.email).map(|e| e.to_lowercase());
        let password = self.password.filter(|p| !p.is_empty());
        let confirm = self.confirm_password.filter(|p| !p.is_empty());

        let (Some(name), Some(email), Some(password), Some(confirm)) =
            (name, email, password, confirm)
        else {
            return Err(AppError::InvalidInput(
                "Please fill in all required fields.".to_string(),
            ));
        };

        if password != confirm {
            return Err(AppError::InvalidInput("Passwords do not match.".to_string()));
        }

        let age = match non_blank(self.age) {
            Some(raw) => match raw.parse::<i32>() {
                Ok(age) if (MIN_AGE..=MAX_AGE).contains(&age) => Some(age),
                _ => {
                    return Err(AppError::InvalidInput(format!(
                        "Age must be between {} and {}.",
                        MIN_AGE, MAX_AGE
                    )))
                }
            },
            None => None,
        };

        let role = match non_blank(self.role).as_deref() {
            None | Some("normal_user") => Role::NormalUser,
            Some("verified_user") => Role::VerifiedUser,
            Some(_) => {
                return Err(AppError::InvalidInput("Invalid account type.".to_string()));
            }
        };

        let verified_entity = match role {
            Role::VerifiedUser => {
                let entity_type = non_blank(self.verified_entity_type);
                let entity_id = parse_opt::<i64>(self.verified_entity_id.as_deref());
                Some(
                    VerifiedEntity::from_parts(entity_type.as_deref(), entity_id).ok_or_else(
                        || {
                            AppError::InvalidInput(
                                "Verified accounts must be linked to a celebrity or production company."
                                    .to_string(),
                            )
                        },
                    )?,
                )
            }
            _ => None,
        };

        Ok(NewUser {
            name,
            email,
            password,
            role,
            age,
            gender: non_blank(self.gender),
            verified_entity,
        })
    }
}
