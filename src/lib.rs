//! Pokedex: Pokemon catalog service over PostgreSQL.

pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod response;
pub mod routes;
pub mod seed;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::Settings;
pub use error::{AppError, ConfigError};
pub use model::{Ability, HiddenAbilities, IntFilter, Page, Pokemon, PokemonFilter, PokemonInput, PokemonType, Stat};
pub use routes::{app, common_routes_with_ready, pokemon_routes};
pub use seed::seed_if_empty;
pub use service::CatalogService;
pub use state::AppState;
pub use store::{connect, ensure_database_exists, ensure_schema};
