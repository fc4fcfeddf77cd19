use sqlx::PgPool;

use crate::error::AppResult;

/// Rebuilds every user's genre weights from the full review history.
///
/// A weight is the user's average score over movies and shows in that
/// genre, rounded to two decimals. The delete and re-insert share one
/// transaction, so readers see either the old or the new table and two
/// runs over unchanged reviews produce identical rows.
pub async fn populate_user_preferences(pool: &PgPool) -> AppResult<u64> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM user_preferences")
        .execute(&mut *tx)
        .await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO user_preferences (user_id, genre_id, preference_score)
        SELECT scored.user_id, scored.genre_id, ROUND(AVG(scored.score)::numeric, 2)::float8
        FROM (
            SELECT r.user_id, mg.genre_id, r.score
            FROM reviews r
            JOIN movie_genres mg ON mg.movie_id = r.movie_id
            UNION ALL
            SELECT r.user_id, sg.genre_id, r.score
            FROM reviews r
            JOIN show_genres sg ON sg.show_id = r.show_id
        ) AS scored
        GROUP BY scored.user_id, scored.genre_id
        "#,
    )
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;

    tracing::info!(rows = inserted, "User preferences rebuilt");
    Ok(inserted)
}
