//! Celebrities and production companies, the records verified accounts
//! may speak for.

use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{
        catalog::{CelebrityRecord, CompanyRecord},
        Celebrity, Credit, ProductionCompany,
    },
};

const CELEBRITY_COLUMNS: &str =
    "celebrity_id, name, birth_year, nationality, bio, created_at, updated_at";
const COMPANY_COLUMNS: &str =
    "company_id, name, founded_year, country, description, created_at, updated_at";

pub async fn list_celebrities(pool: &PgPool) -> AppResult<Vec<Celebrity>> {
    let celebrities = sqlx::query_as::<_, Celebrity>(&format!(
        "SELECT {CELEBRITY_COLUMNS} FROM celebrities ORDER BY LOWER(name), name, celebrity_id"
    ))
    .fetch_all(pool)
    .await?;
    Ok(celebrities)
}

pub async fn get_celebrity(pool: &PgPool, celebrity_id: i64) -> AppResult<Option<Celebrity>> {
    let celebrity = sqlx::query_as::<_, Celebrity>(&format!(
        "SELECT {CELEBRITY_COLUMNS} FROM celebrities WHERE celebrity_id = $1"
    ))
    .bind(celebrity_id)
    .fetch_optional(pool)
    .await?;
    Ok(celebrity)
}

pub async fn create_celebrity(pool: &PgPool, record: &CelebrityRecord) -> AppResult<i64> {
    let celebrity_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO celebrities (name, birth_year, nationality, bio)
        VALUES ($1, $2, $3, $4)
        RETURNING celebrity_id
        "#,
    )
    .bind(&record.name)
    .bind(record.birth_year)
    .bind(&record.nationality)
    .bind(&record.bio)
    .fetch_one(pool)
    .await?;

    tracing::info!(celebrity_id, name = %record.name, "Celebrity created");
    Ok(celebrity_id)
}

pub async fn update_celebrity(
    pool: &PgPool,
    celebrity_id: i64,
    record: &CelebrityRecord,
) -> AppResult<bool> {
    let updated = sqlx::query(
        r#"
        UPDATE celebrities
        SET name = $1, birth_year = $2, nationality = $3, bio = $4, updated_at = NOW()
        WHERE celebrity_id = $5
        "#,
    )
    .bind(&record.name)
    .bind(record.birth_year)
    .bind(&record.nationality)
    .bind(&record.bio)
    .bind(celebrity_id)
    .execute(pool)
    .await?
    .rows_affected();

    if updated > 0 {
        tracing::info!(celebrity_id, "Celebrity updated");
    }
    Ok(updated > 0)
}

/// Accounts verified against this celebrity lose the link and revert to
/// normal users
pub async fn delete_celebrity(pool: &PgPool, celebrity_id: i64) -> AppResult<bool> {
    let mut tx = pool.begin().await?;

    unlink_verified_accounts(&mut tx, "celebrity", celebrity_id).await?;

    let deleted = sqlx::query("DELETE FROM celebrities WHERE celebrity_id = $1")
        .bind(celebrity_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    if deleted > 0 {
        tracing::info!(celebrity_id, "Celebrity deleted");
    }
    Ok(deleted > 0)
}

/// Movies a celebrity is credited on
pub async fn get_celebrity_credits(pool: &PgPool, celebrity_id: i64) -> AppResult<Vec<Credit>> {
    let credits = sqlx::query_as::<_, Credit>(
        r#"
        SELECT m.movie_id AS id, m.title AS name, mc.role
        FROM movie_celebrities mc
        JOIN movies m ON m.movie_id = mc.movie_id
        WHERE mc.celebrity_id = $1
        ORDER BY m.year DESC NULLS LAST, m.title
        "#,
    )
    .bind(celebrity_id)
    .fetch_all(pool)
    .await?;
    Ok(credits)
}

pub async fn list_companies(pool: &PgPool) -> AppResult<Vec<ProductionCompany>> {
    let companies = sqlx::query_as::<_, ProductionCompany>(&format!(
        "SELECT {COMPANY_COLUMNS} FROM production_companies ORDER BY LOWER(name), name, company_id"
    ))
    .fetch_all(pool)
    .await?;
    Ok(companies)
}

pub async fn get_company(pool: &PgPool, company_id: i64) -> AppResult<Option<ProductionCompany>> {
    let company = sqlx::query_as::<_, ProductionCompany>(&format!(
        "SELECT {COMPANY_COLUMNS} FROM production_companies WHERE company_id = $1"
    ))
    .bind(company_id)
    .fetch_optional(pool)
    .await?;
    Ok(company)
}

pub async fn create_company(pool: &PgPool, record: &CompanyRecord) -> AppResult<i64> {
    let company_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO production_companies (name, founded_year, country, description)
        VALUES ($1, $2, $3, $4)
        RETURNING company_id
        "#,
    )
    .bind(&record.name)
    .bind(record.founded_year)
    .bind(&record.country)
    .bind(&record.description)
    .fetch_one(pool)
    .await?;

    tracing::info!(company_id, name = %record.name, "Production company created");
    Ok(company_id)
}

pub async fn update_company(
    pool: &PgPool,
    company_id: i64,
    record: &CompanyRecord,
) -> AppResult<bool> {
    let updated = sqlx::query(
        r#"
        UPDATE production_companies
        SET name = $1, founded_year = $2, country = $3, description = $4, updated_at = NOW()
        WHERE company_id = $5
        "#,
    )
    .bind(&record.name)
    .bind(record.founded_year)
    .bind(&record.country)
    .bind(&record.description)
    .bind(company_id)
    .execute(pool)
    .await?
    .rows_affected();

    if updated > 0 {
        tracing::info!(company_id, "Production company updated");
    }
    Ok(updated > 0)
}

pub async fn delete_company(pool: &PgPool, company_id: i64) -> AppResult<bool> {
    let mut tx = pool.begin().await?;

    unlink_verified_accounts(&mut tx, "company", company_id).await?;

    let deleted = sqlx::query("DELETE FROM production_companies WHERE company_id = $1")
        .bind(company_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    if deleted > 0 {
        tracing::info!(company_id, "Production company deleted");
    }
    Ok(deleted > 0)
}

/// Movies a company is credited on
pub async fn get_company_credits(pool: &PgPool, company_id: i64) -> AppResult<Vec<Credit>> {
    let credits = sqlx::query_as::<_, Credit>(
        r#"
        SELECT m.movie_id AS id, m.title AS name, mp.role
        FROM movie_productions mp
        JOIN movies m ON m.movie_id = mp.movie_id
        WHERE mp.company_id = $1
        ORDER BY m.year DESC NULLS LAST, m.title
        "#,
    )
    .bind(company_id)
    .fetch_all(pool)
    .await?;
    Ok(credits)
}

async fn unlink_verified_accounts(
    conn: &mut sqlx::PgConnection,
    entity_type: &str,
    entity_id: i64,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET verified_entity_type = NULL, verified_entity_id = NULL,
            role = CASE WHEN role = 'verified_user' THEN 'normal_user' ELSE role END,
            updated_at = NOW()
        WHERE verified_entity_type = $1 AND verified_entity_id = $2
        "#,
    )
    .bind(entity_type)
    .bind(entity_id)
    .execute(conn)
    .await?;
    Ok(())
}
