use sqlx::PgPool;

use crate::{
    error::{AppError, AppResult},
    models::{catalog::like_pattern, Friend},
};

/// Records a friendship as the pair the requester supplied.
///
/// Self-friendship, unknown users and an existing pair in either
/// orientation are all rejected.
pub async fn add_friend(pool: &PgPool, user_id: i64, friend_id: i64) -> AppResult<()> {
    if user_id == friend_id {
        return Err(AppError::InvalidInput(
            "You cannot add yourself as a friend.".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let known: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE user_id = $1)")
        .bind(friend_id)
        .fetch_one(&mut *tx)
        .await?;
    if !known {
        return Err(AppError::NotFound(format!("user {}", friend_id)));
    }

    if are_friends_in(&mut tx, user_id, friend_id).await? {
        return Err(AppError::Duplicate("friendship".to_string()));
    }

    sqlx::query("INSERT INTO friends (user_id1, user_id2) VALUES ($1, $2)")
        .bind(user_id)
        .bind(friend_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(user_id, friend_id, "Friend added");
    Ok(())
}

/// Removes the friendship regardless of which side created it
pub async fn remove_friend(pool: &PgPool, user_id: i64, friend_id: i64) -> AppResult<bool> {
    let removed = sqlx::query(
        r#"
        DELETE FROM friends
        WHERE (user_id1 = $1 AND user_id2 = $2) OR (user_id1 = $2 AND user_id2 = $1)
        "#,
    )
    .bind(user_id)
    .bind(friend_id)
    .execute(pool)
    .await?
    .rows_affected();

    if removed > 0 {
        tracing::info!(user_id, friend_id, "Friend removed");
    }
    Ok(removed > 0)
}

async fn are_friends_in(conn: &mut sqlx::PgConnection, a: i64, b: i64) -> AppResult<bool> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM friends
            WHERE (user_id1 = $1 AND user_id2 = $2) OR (user_id1 = $2 AND user_id2 = $1)
        )
        "#,
    )
    .bind(a)
    .bind(b)
    .fetch_one(conn)
    .await?;
    Ok(exists)
}

/// Symmetric: `are_friends(a, b) == are_friends(b, a)`
pub async fn are_friends(pool: &PgPool, a: i64, b: i64) -> AppResult<bool> {
    let mut conn = pool.acquire().await?;
    are_friends_in(&mut conn, a, b).await
}

/// Friends of `user_id`, most recent friendship first, optionally filtered
/// by a name or email substring
pub async fn list_friends(
    pool: &PgPool,
    user_id: i64,
    search: Option<&str>,
) -> AppResult<Vec<Friend>> {
    let pattern = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(like_pattern);

    let friends = sqlx::query_as::<_, Friend>(
        r#"
        SELECT u.user_id, u.name, u.email, u.age, u.gender, u.role,
               f.created_at AS friendship_date
        FROM friends f
        JOIN users u
          ON u.user_id = CASE WHEN f.user_id1 = $1 THEN f.user_id2 ELSE f.user_id1 END
        WHERE (f.user_id1 = $1 OR f.user_id2 = $1)
          AND ($2::text IS NULL OR u.name ILIKE $2 OR u.email ILIKE $2)
        ORDER BY f.created_at DESC, u.name
        "#,
    )
    .bind(user_id)
    .bind(pattern)
    .fetch_all(pool)
    .await?;
    Ok(friends)
}
