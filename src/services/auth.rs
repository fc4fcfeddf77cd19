use sqlx::PgPool;

use crate::{
    db,
    error::{AppError, AppResult},
    models::{NewUser, User},
};

/// bcrypt work factor for new password hashes
pub const HASH_COST: u32 = bcrypt::DEFAULT_COST;

/// Hashes off the async runtime; bcrypt is deliberately slow
pub async fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(AppError::from)
}

pub async fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password check task failed: {}", e)))?
        .map_err(AppError::from)
}

/// Creates the account for a validated registration.
///
/// An already registered email fails with [`AppError::Duplicate`] before any
/// hashing work is done.
pub async fn register(pool: &PgPool, user: &NewUser) -> AppResult<i64> {
    if db::users::get_user_by_email(pool, &user.email).await?.is_some() {
        return Err(AppError::Duplicate("Email already registered.".to_string()));
    }

    let hash = hash_password(&user.password, HASH_COST).await?;
    db::users::create_user(pool, user, &hash).await
}

/// Returns the user when the email and password match.
///
/// Unknown emails and wrong passwords are indistinguishable to the caller.
pub async fn authenticate(pool: &PgPool, email: &str, password: &str) -> AppResult<Option<User>> {
    let Some(user) = db::users::get_user_by_email(pool, email).await? else {
        return Ok(None);
    };

    if verify_password(password, &user.password_hash).await? {
        Ok(Some(user))
    } else {
        tracing::warn!(user_id = user.user_id, "Failed login attempt");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("hunter22", 4).await.unwrap();
        assert_ne!(hash, "hunter22");
        assert!(verify_password("hunter22", &hash).await.unwrap());
        assert!(!verify_password("hunter23", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_rejects_malformed_hash() {
        let result = verify_password("hunter22", "not-a-bcrypt-hash").await;
        assert!(matches!(result, Err(AppError::Password(_))));
    }
}
