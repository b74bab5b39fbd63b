//! Access façade over the catalog: reads against the pool, writes inside one transaction each.

use crate::error::AppError;
use crate::model::{
    HiddenAbilities, HiddenAbilitiesRow, Page, Pokemon, PokemonFilter, PokemonInput, PokemonRow,
};
use crate::service::validation::PokemonValidator;
use crate::service::writer::{self, bind_query_as};
use crate::sql::{select_by_id, select_by_name, select_hidden_abilities, select_list};
use sqlx::PgPool;

pub struct CatalogService;

impl CatalogService {
    pub async fn get_by_id(pool: &PgPool, id: i32) -> Result<Pokemon, AppError> {
        let row: Option<PokemonRow> = bind_query_as(&select_by_id(id)).fetch_optional(pool).await?;
        row.map(Pokemon::from)
            .ok_or_else(|| AppError::NotFound(format!("pokemon {}", id)))
    }

    /// Exact, case-sensitive name match.
    pub async fn get_by_name(pool: &PgPool, name: &str) -> Result<Pokemon, AppError> {
        let row: Option<PokemonRow> = bind_query_as(&select_by_name(name)).fetch_optional(pool).await?;
        row.map(Pokemon::from)
            .ok_or_else(|| AppError::NotFound(format!("pokemon '{}'", name)))
    }

    /// Filtered page of Pokemon in id order. An empty page is not an error.
    pub async fn list(pool: &PgPool, page: Page, filter: &PokemonFilter) -> Result<Vec<Pokemon>, AppError> {
        PokemonValidator::validate_page(&page)?;
        PokemonValidator::validate_filter(filter)?;
        let rows: Vec<PokemonRow> = bind_query_as(&select_list(filter, page)).fetch_all(pool).await?;
        Ok(rows.into_iter().map(Pokemon::from).collect())
    }

    pub async fn list_hidden_abilities(
        pool: &PgPool,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<HiddenAbilities>, AppError> {
        PokemonValidator::validate_skip_limit(limit)?;
        let rows: Vec<HiddenAbilitiesRow> = bind_query_as(&select_hidden_abilities(skip, limit))
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(HiddenAbilities::from).collect())
    }

    /// Create a Pokemon with its children atomically. Returns the new id.
    pub async fn create(pool: &PgPool, input: &PokemonInput) -> Result<i32, AppError> {
        PokemonValidator::validate_input(input)?;
        let mut tx = pool.begin().await?;
        let id = writer::create(&mut tx, input).await?;
        tx.commit().await.map_err(|e| AppError::from_write(e, &input.name))?;
        Ok(id)
    }

    /// Replace scalar fields and the entire child set of an existing Pokemon.
    pub async fn replace(pool: &PgPool, id: i32, input: &PokemonInput) -> Result<(), AppError> {
        PokemonValidator::validate_input(input)?;
        let mut tx = pool.begin().await?;
        writer::replace(&mut tx, id, input).await?;
        tx.commit().await.map_err(|e| AppError::from_write(e, &input.name))?;
        Ok(())
    }

    /// Delete a Pokemon and its children. `NotFound` when the id does not exist.
    pub async fn delete(pool: &PgPool, id: i32) -> Result<(), AppError> {
        let mut tx = pool.begin().await?;
        if !writer::delete(&mut tx, id).await? {
            return Err(AppError::NotFound(format!("pokemon {}", id)));
        }
        tx.commit().await?;
        Ok(())
    }
}
