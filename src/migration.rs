//! Database bootstrap: create the database if missing, then the schema and the
//! owners / cats / achievements / achievement_cats tables. Idempotent.

use crate::error::AppError;
use crate::models::{limits, CatColor};
use crate::store::quoted;
use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;

/// DDL statements in dependency order for tables in `schema`.
pub fn schema_ddl(schema: &str) -> Vec<String> {
    let s = quoted(schema);
    let table = |name: &str| format!("{}.{}", s, quoted(name));
    let owners = table("owners");
    let cats = table("cats");
    let achievements = table("achievements");
    let links = table("achievement_cats");
    let colors: Vec<String> = CatColor::ALL.iter().map(|c| format!("'{}'", c.as_str())).collect();

    vec![
        format!("CREATE SCHEMA IF NOT EXISTS {}", s),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {owners} (
                id BIGSERIAL PRIMARY KEY,
                first_name VARCHAR({owner_len}) NOT NULL,
                last_name VARCHAR({owner_len}) NOT NULL
            )
            "#,
            owners = owners,
            owner_len = limits::OWNER_NAME,
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {cats} (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR({name_len}) NOT NULL,
                color VARCHAR({color_len}) NOT NULL CHECK (color IN ({colors})),
                birth_year INTEGER NOT NULL,
                owner_id BIGINT NOT NULL REFERENCES {owners} (id) ON DELETE CASCADE
            )
            "#,
            cats = cats,
            name_len = limits::CAT_NAME,
            color_len = limits::CAT_COLOR,
            colors = colors.join(", "),
            owners = owners,
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS cats_owner_id_idx ON {} (owner_id)",
            cats
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {achievements} (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR({name_len}) NOT NULL UNIQUE
            )
            "#,
            achievements = achievements,
            name_len = limits::ACHIEVEMENT_NAME,
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {links} (
                id BIGSERIAL PRIMARY KEY,
                achievement_id BIGINT NOT NULL REFERENCES {achievements} (id) ON DELETE CASCADE,
                cat_id BIGINT NOT NULL REFERENCES {cats} (id) ON DELETE CASCADE
            )
            "#,
            links = links,
            achievements = achievements,
            cats = cats,
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS achievement_cats_cat_id_idx ON {} (cat_id)",
            links
        ),
    ]
}

/// Apply [`schema_ddl`] in one transaction.
pub async fn apply_migrations(pool: &PgPool, schema: &str) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    for sql in schema_ddl(schema) {
        tracing::debug!(sql = %sql.trim(), "migration");
        sqlx::query(&sql).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    tracing::info!(schema, "schema ready");
    Ok(())
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url.rfind('/').ok_or_else(|| AppError::BadRequest("DATABASE_URL: no path".into()))? + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let (db_name, query) = match path_and_query.split_once('?') {
        Some((name, query)) => (name, Some(query)),
        None => (path_and_query, None),
    };
    let base = url.get(..path_start).unwrap_or(url);
    // Connection options (sslmode etc.) apply to the bootstrap connection too.
    let admin_url = match query {
        Some(q) if !q.is_empty() => format!("{}postgres?{}", base, q),
        _ => format!("{}postgres", base),
    };
    Ok((admin_url, db_name.trim().to_string()))
}
