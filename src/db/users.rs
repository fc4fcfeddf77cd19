use sqlx::PgPool;

use crate::{
    error::{AppError, AppResult},
    models::{NewUser, Role, User, UserListing, UserStats, VerifiedEntity},
};

const USER_COLUMNS: &str = "user_id, name, email, password_hash, role, verified_entity_type, \
     verified_entity_id, age, gender, created_at, updated_at";

pub async fn get_user_by_email(pool: &PgPool, email: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(email.trim().to_lowercase())
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn get_user_by_id(pool: &PgPool, user_id: i64) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Creates a user and returns the new id.
///
/// The verified-entity link is checked against the referenced table in the
/// same transaction as the insert. A duplicate email surfaces as
/// [`AppError::Duplicate`].
pub async fn create_user(pool: &PgPool, user: &NewUser, password_hash: &str) -> AppResult<i64> {
    let mut tx = pool.begin().await?;

    if let Some(entity) = user.verified_entity {
        let exists: bool = match entity {
            VerifiedEntity::Celebrity(id) => {
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM celebrities WHERE celebrity_id = $1)")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?
            }
            VerifiedEntity::Company(id) => {
                sqlx::query_scalar(
                    "SELECT EXISTS (SELECT 1 FROM production_companies WHERE company_id = $1)",
                )
                .bind(id)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        if !exists {
            return Err(AppError::InvalidInput(format!(
                "Unknown {} {}",
                entity.type_str(),
                entity.id()
            )));
        }
    }

    let user_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO users (name, email, password_hash, role, verified_entity_type,
                           verified_entity_id, age, gender)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING user_id
        "#,
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(password_hash)
    .bind(user.role.as_str())
    .bind(user.verified_entity.map(|e| e.type_str()))
    .bind(user.verified_entity.map(|e| e.id()))
    .bind(user.age)
    .bind(&user.gender)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(user_id, role = user.role.as_str(), "User created");
    Ok(user_id)
}

pub async fn get_user_stats(pool: &PgPool, user_id: i64) -> AppResult<UserStats> {
    let stats = sqlx::query_as::<_, UserStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM reviews WHERE user_id = $1) AS review_count,
            (SELECT COUNT(*) FROM friends WHERE user_id1 = $1 OR user_id2 = $1) AS friend_count,
            (SELECT ROUND(AVG(score)::numeric, 2)::float8 FROM reviews WHERE user_id = $1) AS avg_score
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(stats)
}

/// All accounts, newest first
pub async fn list_users(pool: &PgPool) -> AppResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, user_id DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(users)
}

/// Everyone except `user_id`, by name
pub async fn list_other_users(pool: &PgPool, user_id: i64) -> AppResult<Vec<UserListing>> {
    let users = sqlx::query_as::<_, UserListing>(
        "SELECT user_id, name, email FROM users WHERE user_id <> $1 ORDER BY name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(users)
}

/// Changes a user's role; returns false when the user does not exist.
///
/// Demoting to `normal_user` drops any verified-entity link; promoting to
/// `verified_user` requires one to already be present.
pub async fn set_role(pool: &PgPool, user_id: i64, role: Role) -> AppResult<bool> {
    let result = match role {
        Role::NormalUser => {
            sqlx::query(
                r#"
                UPDATE users
                SET role = $1, verified_entity_type = NULL, verified_entity_id = NULL,
                    updated_at = NOW()
                WHERE user_id = $2
                "#,
            )
            .bind(role.as_str())
            .bind(user_id)
            .execute(pool)
            .await?
        }
        Role::VerifiedUser => {
            let result = sqlx::query(
                r#"
                UPDATE users SET role = $1, updated_at = NOW()
                WHERE user_id = $2 AND verified_entity_type IS NOT NULL
                "#,
            )
            .bind(role.as_str())
            .bind(user_id)
            .execute(pool)
            .await?;
            if result.rows_affected() == 0 && get_user_by_id(pool, user_id).await?.is_some() {
                return Err(AppError::InvalidInput(
                    "Only accounts linked to a celebrity or company can be verified.".to_string(),
                ));
            }
            result
        }
        Role::Admin => {
            sqlx::query("UPDATE users SET role = $1, updated_at = NOW() WHERE user_id = $2")
                .bind(role.as_str())
                .bind(user_id)
                .execute(pool)
                .await?
        }
    };

    Ok(result.rows_affected() > 0)
}
