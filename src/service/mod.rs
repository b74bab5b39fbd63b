//! Catalog façade, entity write protocol and input validation.

mod catalog;
mod validation;
pub mod writer;
pub use catalog::CatalogService;
pub use validation::{PokemonValidator, ELEMENTAL_TYPES};
