//! HTTP handlers for the pokemon catalog.

pub mod pokemon;
pub use pokemon::*;
