//! Schema store: pool setup, database bootstrap and table DDL.

use crate::config::Settings;
use crate::error::{AppError, ConfigError};
use crate::sql::{ABILITIES_TABLE, CHILD_TABLES, POKEMON_TABLE, STATS_TABLE, TYPES_TABLE};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

/// The URL itself may carry a password, so only the reason is kept.
fn invalid_url(reason: impl ToString) -> AppError {
    ConfigError::Invalid {
        key: "DATABASE_URL",
        value: reason.to_string(),
    }
    .into()
}

fn connect_options(settings: &Settings) -> Result<PgConnectOptions, AppError> {
    let opts = PgConnectOptions::from_str(&settings.database_url)
        .map_err(invalid_url)?;
    Ok(match &settings.db_schema {
        Some(schema) => opts.options([("search_path", schema.as_str())]),
        None => opts,
    })
}

/// Open the connection pool. Every connection uses `settings.db_schema` as search_path when set.
pub async fn connect(settings: &Settings) -> Result<PgPool, AppError> {
    let opts = connect_options(settings)?;
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect_with(opts)
        .await?;
    Ok(pool)
}

/// Pool that connects on first use.
pub fn connect_lazy(settings: &Settings) -> Result<PgPool, AppError> {
    let opts = connect_options(settings)?;
    Ok(PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect_lazy_with(opts))
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// `postgres` maintenance database to run CREATE DATABASE. Call before [`connect`].
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = split_db_name(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = PgConnectOptions::from_str(&admin_url)
        .map_err(invalid_url)?;
    let mut conn = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

/// Returns (maintenance url, database name) for a postgres URL.
fn split_db_name(url: &str) -> Result<(String, String), AppError> {
    let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
    let path_start = url[scheme_end..]
        .find('/')
        .map(|i| i + scheme_end + 1)
        .ok_or_else(|| invalid_url("no database path"))?;
    let rest = &url[path_start..];
    let (db_name, query) = match rest.find('?') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, ""),
    };
    let admin_url = format!("{}postgres{}", &url[..path_start], query);
    Ok((admin_url, db_name.trim().to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Create the optional schema and the four catalog tables if missing.
pub async fn ensure_schema(pool: &PgPool, schema: Option<&str>) -> Result<(), AppError> {
    if let Some(schema) = schema {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema)))
            .execute(pool)
            .await?;
    }

    let ddl = [
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {POKEMON_TABLE} (
                id SERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                height INTEGER NOT NULL,
                weight INTEGER NOT NULL,
                xp INTEGER NOT NULL,
                image_url TEXT NOT NULL,
                pokemon_url TEXT NOT NULL,
                CONSTRAINT {constraint} UNIQUE (name)
            )
            "#,
            constraint = crate::error::POKEMON_NAME_CONSTRAINT,
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {ABILITIES_TABLE} (
                id SERIAL PRIMARY KEY,
                pokemon_id INTEGER NOT NULL REFERENCES {POKEMON_TABLE}(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                is_hidden BOOLEAN NOT NULL
            )
            "#
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {STATS_TABLE} (
                id SERIAL PRIMARY KEY,
                pokemon_id INTEGER NOT NULL REFERENCES {POKEMON_TABLE}(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                base_stat INTEGER NOT NULL
            )
            "#
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {TYPES_TABLE} (
                id SERIAL PRIMARY KEY,
                pokemon_id INTEGER NOT NULL REFERENCES {POKEMON_TABLE}(id) ON DELETE CASCADE,
                name TEXT NOT NULL
            )
            "#
        ),
    ];
    for stmt in &ddl {
        sqlx::query(stmt).execute(pool).await?;
    }
    for table in CHILD_TABLES {
        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS {table}_pokemon_id_idx ON {table} (pokemon_id)"
        ))
        .execute(pool)
        .await?;
    }
    Ok(())
}

pub async fn count_pokemon(pool: &PgPool) -> Result<i64, AppError> {
    let n: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", POKEMON_TABLE))
        .fetch_one(pool)
        .await?;
    Ok(n)
}
