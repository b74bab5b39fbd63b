//! Safe SQL builder: identifiers are constants, values are bound parameters.

mod builder;
pub mod params;
pub use builder::*;
pub use params::*;
