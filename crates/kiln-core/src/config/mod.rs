//! Engine configuration
//!
//! Every field has a default, so an empty `kiln.toml` is a valid configuration.

pub mod consts;
mod model;

pub use model::{Delimiters, EngineConfig};
