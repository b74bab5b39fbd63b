//! Catalog records, request bodies and list parameters.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Ability {
    pub name: String,
    pub is_hidden: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Stat {
    pub name: String,
    pub base_stat: i32,
}

/// Elemental type tag. Stored in the `types` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PokemonType {
    pub name: String,
}

/// A Pokemon with its child collections, as read from the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pokemon {
    pub id: i32,
    pub name: String,
    pub height: i32,
    pub weight: i32,
    pub xp: i32,
    pub image_url: String,
    pub pokemon_url: String,
    pub abilities: Vec<Ability>,
    pub stats: Vec<Stat>,
    pub types: Vec<PokemonType>,
}

/// Body for create and replace. Child collections default to empty when omitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PokemonInput {
    pub name: String,
    pub height: i32,
    pub weight: i32,
    pub xp: i32,
    pub image_url: String,
    pub pokemon_url: String,
    #[serde(default)]
    pub abilities: Vec<Ability>,
    #[serde(default)]
    pub stats: Vec<Stat>,
    #[serde(default)]
    pub types: Vec<PokemonType>,
}

/// Projection of a Pokemon onto its hidden abilities only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HiddenAbilities {
    pub id: i32,
    pub name: String,
    pub hidden_abilities: Vec<Ability>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct CreatedId {
    pub id: i32,
}

/// Row shape of the list/read queries: children arrive as JSON arrays from scalar subqueries.
#[derive(sqlx::FromRow)]
pub(crate) struct PokemonRow {
    pub id: i32,
    pub name: String,
    pub height: i32,
    pub weight: i32,
    pub xp: i32,
    pub image_url: String,
    pub pokemon_url: String,
    pub abilities: Json<Vec<Ability>>,
    pub stats: Json<Vec<Stat>>,
    pub types: Json<Vec<PokemonType>>,
}

impl From<PokemonRow> for Pokemon {
    fn from(row: PokemonRow) -> Self {
        Pokemon {
            id: row.id,
            name: row.name,
            height: row.height,
            weight: row.weight,
            xp: row.xp,
            image_url: row.image_url,
            pokemon_url: row.pokemon_url,
            abilities: row.abilities.0,
            stats: row.stats.0,
            types: row.types.0,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct HiddenAbilitiesRow {
    pub id: i32,
    pub name: String,
    pub hidden_abilities: Json<Vec<Ability>>,
}

impl From<HiddenAbilitiesRow> for HiddenAbilities {
    fn from(row: HiddenAbilitiesRow) -> Self {
        HiddenAbilities {
            id: row.id,
            name: row.name,
            hidden_abilities: row.hidden_abilities.0,
        }
    }
}

/// Exact and inclusive range match on one integer attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IntFilter {
    pub exact: Option<i32>,
    pub min: Option<i32>,
    pub max: Option<i32>,
}

impl IntFilter {
    pub fn is_empty(&self) -> bool {
        self.exact.is_none() && self.min.is_none() && self.max.is_none()
    }
}

/// Optional list filters. Every present field narrows the result (AND); absent fields impose nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PokemonFilter {
    pub name: Option<String>,
    pub height: IntFilter,
    pub weight: IntFilter,
    pub xp: IntFilter,
    /// Matches when any stat row of the Pokemon has a base_stat in range.
    pub base_stat: IntFilter,
    pub abilities: Vec<String>,
    pub stats: Vec<String>,
    pub types: Vec<String>,
    /// Matches when any ability row of the Pokemon has this hidden flag.
    pub is_hidden: Option<bool>,
}

/// One-based page with a row limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 1000;

    pub fn new(page: u32, limit: u32) -> Self {
        Page { page, limit }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new(1, Self::DEFAULT_LIMIT)
    }
}
