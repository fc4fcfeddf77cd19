use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::{
    error::AppResult,
    models::{CatalogFilter, Credit, Genre, MovieInput, MovieSummary, ReviewWithTitles},
};

const SUMMARY_SELECT: &str = r#"
    SELECT m.movie_id, m.title, m.description, m.year, m.length, m.age_rating,
           m.created_at, m.updated_at,
           COUNT(r.review_id) AS review_count,
           ROUND(AVG(r.score)::numeric, 2)::float8 AS avg_rating
    FROM movies m
    LEFT JOIN reviews r ON r.movie_id = m.movie_id
"#;

/// Movies matching the optional genre and title filters, by title
pub async fn list_movies(pool: &PgPool, filter: &CatalogFilter) -> AppResult<Vec<MovieSummary>> {
    let mut query = QueryBuilder::<Postgres>::new(SUMMARY_SELECT);
    query.push(" WHERE TRUE");

    if let Some(genre_id) = filter.genre {
        query
            .push(" AND EXISTS (SELECT 1 FROM movie_genres mg WHERE mg.movie_id = m.movie_id AND mg.genre_id = ")
            .push_bind(genre_id)
            .push(")");
    }

    if let Some(pattern) = filter.title_pattern() {
        query.push(" AND m.title ILIKE ").push_bind(pattern);
    }

    query.push(" GROUP BY m.movie_id ORDER BY LOWER(m.title), m.title, m.movie_id");

    let movies = query
        .build_query_as::<MovieSummary>()
        .fetch_all(pool)
        .await?;
    Ok(movies)
}

pub async fn get_movie(pool: &PgPool, movie_id: i64) -> AppResult<Option<MovieSummary>> {
    let movie = sqlx::query_as::<_, MovieSummary>(&format!(
        "{SUMMARY_SELECT} WHERE m.movie_id = $1 GROUP BY m.movie_id"
    ))
    .bind(movie_id)
    .fetch_optional(pool)
    .await?;
    Ok(movie)
}

pub async fn get_movie_genres(pool: &PgPool, movie_id: i64) -> AppResult<Vec<Genre>> {
    let genres = sqlx::query_as::<_, Genre>(
        r#"
        SELECT g.genre_id, g.name, g.description
        FROM genres g
        JOIN movie_genres mg ON mg.genre_id = g.genre_id
        WHERE mg.movie_id = $1
        ORDER BY g.name
        "#,
    )
    .bind(movie_id)
    .fetch_all(pool)
    .await?;
    Ok(genres)
}

/// Cast and crew credited on a movie
pub async fn get_movie_celebrities(pool: &PgPool, movie_id: i64) -> AppResult<Vec<Credit>> {
    let credits = sqlx::query_as::<_, Credit>(
        r#"
        SELECT c.celebrity_id AS id, c.name, mc.role
        FROM celebrities c
        JOIN movie_celebrities mc ON mc.celebrity_id = c.celebrity_id
        WHERE mc.movie_id = $1
        ORDER BY c.name, mc.role
        "#,
    )
    .bind(movie_id)
    .fetch_all(pool)
    .await?;
    Ok(credits)
}

pub async fn get_movie_production_companies(pool: &PgPool, movie_id: i64) -> AppResult<Vec<Credit>> {
    let credits = sqlx::query_as::<_, Credit>(
        r#"
        SELECT pc.company_id AS id, pc.name, mp.role
        FROM production_companies pc
        JOIN movie_productions mp ON mp.company_id = pc.company_id
        WHERE mp.movie_id = $1
        ORDER BY pc.name, mp.role
        "#,
    )
    .bind(movie_id)
    .fetch_all(pool)
    .await?;
    Ok(credits)
}

/// Reviews of a movie, newest first
pub async fn get_movie_reviews(pool: &PgPool, movie_id: i64) -> AppResult<Vec<ReviewWithTitles>> {
    let reviews = sqlx::query_as::<_, ReviewWithTitles>(
        r#"
        SELECT r.review_id, r.user_id, r.movie_id, r.show_id, r.score, r.title, r.content,
               r.created_at, r.updated_at,
               u.name AS user_name, m.title AS movie_title, NULL::text AS show_title
        FROM reviews r
        JOIN users u ON u.user_id = r.user_id
        JOIN movies m ON m.movie_id = r.movie_id
        WHERE r.movie_id = $1
        ORDER BY r.created_at DESC, r.review_id DESC
        "#,
    )
    .bind(movie_id)
    .fetch_all(pool)
    .await?;
    Ok(reviews)
}

/// Replaces a movie's genre and credit links
async fn write_movie_links(
    conn: &mut PgConnection,
    movie_id: i64,
    input: &MovieInput,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO movie_genres (movie_id, genre_id)
        SELECT $1, g FROM UNNEST($2::bigint[]) AS g
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(movie_id)
    .bind(&input.genre_ids)
    .execute(&mut *conn)
    .await?;

    let (cast_ids, cast_roles): (Vec<i64>, Vec<String>) =
        input.cast.iter().map(|c| (c.id, c.role.clone())).unzip();
    sqlx::query(
        r#"
        INSERT INTO movie_celebrities (movie_id, celebrity_id, role)
        SELECT $1, c.id, c.role FROM UNNEST($2::bigint[], $3::text[]) AS c(id, role)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(movie_id)
    .bind(&cast_ids)
    .bind(&cast_roles)
    .execute(&mut *conn)
    .await?;

    let (company_ids, company_roles): (Vec<i64>, Vec<String>) =
        input.production.iter().map(|c| (c.id, c.role.clone())).unzip();
    sqlx::query(
        r#"
        INSERT INTO movie_productions (movie_id, company_id, role)
        SELECT $1, p.id, p.role FROM UNNEST($2::bigint[], $3::text[]) AS p(id, role)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(movie_id)
    .bind(&company_ids)
    .bind(&company_roles)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Inserts a movie with its genres, cast and production credits as one unit
pub async fn create_movie_with_details(pool: &PgPool, input: &MovieInput) -> AppResult<i64> {
    let mut tx = pool.begin().await?;

    let movie_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO movies (title, description, year, length, age_rating)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING movie_id
        "#,
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(input.year)
    .bind(input.length)
    .bind(&input.age_rating)
    .fetch_one(&mut *tx)
    .await?;

    write_movie_links(&mut tx, movie_id, input).await?;
    tx.commit().await?;

    tracing::info!(movie_id, title = %input.title, "Movie created");
    Ok(movie_id)
}

/// Updates a movie and rewrites its links; false when the movie is gone
pub async fn update_movie_with_details(
    pool: &PgPool,
    movie_id: i64,
    input: &MovieInput,
) -> AppResult<bool> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        r#"
        UPDATE movies
        SET title = $1, description = $2, year = $3, length = $4, age_rating = $5,
            updated_at = NOW()
        WHERE movie_id = $6
        "#,
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(input.year)
    .bind(input.length)
    .bind(&input.age_rating)
    .bind(movie_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated == 0 {
        return Ok(false);
    }

    for table in ["movie_genres", "movie_celebrities", "movie_productions"] {
        sqlx::query(&format!("DELETE FROM {table} WHERE movie_id = $1"))
            .bind(movie_id)
            .execute(&mut *tx)
            .await?;
    }

    write_movie_links(&mut tx, movie_id, input).await?;
    tx.commit().await?;

    tracing::info!(movie_id, "Movie updated");
    Ok(true)
}

/// Deletes a movie; its reviews, genre links and credits cascade
pub async fn delete_movie(pool: &PgPool, movie_id: i64) -> AppResult<bool> {
    let deleted = sqlx::query("DELETE FROM movies WHERE movie_id = $1")
        .bind(movie_id)
        .execute(pool)
        .await?
        .rows_affected();

    if deleted > 0 {
        tracing::info!(movie_id, "Movie deleted");
    }
    Ok(deleted > 0)
}
