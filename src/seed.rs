//! First-start dataset loading.

use crate::error::AppError;
use crate::model::PokemonInput;
use crate::service::CatalogService;
use crate::store::count_pokemon;
use sqlx::PgPool;
use std::path::Path;

/// Parse a JSON array of Pokemon records. Keys outside `PokemonInput` (e.g. `id`) are ignored.
pub fn parse_dataset(raw: &str) -> Result<Vec<PokemonInput>, AppError> {
    serde_json::from_str(raw).map_err(|e| AppError::Seed(format!("invalid dataset: {}", e)))
}

/// When the catalog is empty, create every record of the dataset at `path` in file order.
/// Returns the number of Pokemon inserted (0 when the table already had rows).
pub async fn seed_if_empty(pool: &PgPool, path: &Path) -> Result<usize, AppError> {
    if count_pokemon(pool).await? > 0 {
        tracing::info!("catalog already populated; skipping seed");
        return Ok(0);
    }
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::Seed(format!("{}: {}", path.display(), e)))?;
    let records = parse_dataset(&raw)?;
    for input in &records {
        CatalogService::create(pool, input).await?;
    }
    tracing::info!(count = records.len(), path = %path.display(), "seeded catalog");
    Ok(records.len())
}
