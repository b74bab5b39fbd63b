//! Entity write protocol. Every function runs on one transactional connection supplied by the
//! caller; the caller commits, and dropping the transaction uncommitted rolls all of it back.

use crate::error::AppError;
use crate::model::PokemonInput;
use crate::sql::{
    delete_children, delete_pokemon, insert_children, insert_pokemon, select_id, select_id_by_name,
    update_pokemon, PgBindValue, QueryBuf, CHILD_TABLES,
};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{Query, QueryAs, QueryScalar};
use sqlx::{FromRow, PgConnection, Postgres};

fn log_query(q: &QueryBuf) {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
}

pub(crate) fn bind_query(q: &QueryBuf) -> Query<'_, Postgres, PgArguments> {
    log_query(q);
    q.params
        .iter()
        .fold(sqlx::query(&q.sql), |query, p| query.bind(p.clone()))
}

pub(crate) fn bind_query_as<O>(q: &QueryBuf) -> QueryAs<'_, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    log_query(q);
    q.params
        .iter()
        .fold(sqlx::query_as(&q.sql), |query, p| query.bind(p.clone()))
}

pub(crate) fn bind_query_id(q: &QueryBuf) -> QueryScalar<'_, Postgres, i32, PgArguments> {
    log_query(q);
    q.params
        .iter()
        .fold(sqlx::query_scalar(&q.sql), |query, p: &PgBindValue| query.bind(p.clone()))
}

async fn id_for_name(conn: &mut PgConnection, name: &str) -> Result<Option<i32>, sqlx::Error> {
    bind_query_id(&select_id_by_name(name)).fetch_optional(&mut *conn).await
}

async fn insert_child_rows(
    conn: &mut PgConnection,
    pokemon_id: i32,
    input: &PokemonInput,
) -> Result<(), sqlx::Error> {
    for q in insert_children(pokemon_id, input) {
        bind_query(&q).execute(&mut *conn).await?;
    }
    Ok(())
}

/// Insert a Pokemon and all its children. Fails with `DuplicateName` if the name is taken.
pub async fn create(conn: &mut PgConnection, input: &PokemonInput) -> Result<i32, AppError> {
    if id_for_name(conn, &input.name).await?.is_some() {
        return Err(AppError::DuplicateName(input.name.clone()));
    }
    let id = bind_query_id(&insert_pokemon(input))
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::from_write(e, &input.name))?;
    insert_child_rows(conn, id, input).await?;
    tracing::info!(pokemon_id = id, name = %input.name, "pokemon created");
    Ok(id)
}

/// Overwrite scalar fields, then delete every existing child row and insert the new set.
pub async fn replace(conn: &mut PgConnection, id: i32, input: &PokemonInput) -> Result<(), AppError> {
    if bind_query_id(&select_id(id)).fetch_optional(&mut *conn).await?.is_none() {
        return Err(AppError::NotFound(format!("pokemon {}", id)));
    }
    match id_for_name(conn, &input.name).await? {
        Some(other) if other != id => return Err(AppError::DuplicateName(input.name.clone())),
        _ => {}
    }
    bind_query(&update_pokemon(id, input))
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::from_write(e, &input.name))?;
    for table in CHILD_TABLES {
        bind_query(&delete_children(table, id)).execute(&mut *conn).await?;
    }
    insert_child_rows(conn, id, input).await?;
    tracing::info!(pokemon_id = id, name = %input.name, "pokemon replaced");
    Ok(())
}

/// Delete a Pokemon; children go by cascade. Returns false when no row had that id.
pub async fn delete(conn: &mut PgConnection, id: i32) -> Result<bool, AppError> {
    let deleted = bind_query_id(&delete_pokemon(id))
        .fetch_optional(&mut *conn)
        .await?
        .is_some();
    if deleted {
        tracing::info!(pokemon_id = id, "pokemon deleted");
    }
    Ok(deleted)
}
