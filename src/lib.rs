//! Schema-driven generation of EMOD simulation config and campaign files.
//!
//! The engine publishes a schema document describing every parameter. This
//! crate resolves defaults from it, wraps them in schema-checked trees that
//! prune disabled parameters on finalize, and composes campaign events whose
//! objects are validated against the same schema.
pub mod campaign;
pub mod config;
pub mod defaults;
pub mod dict;
pub mod error;
pub mod interventions;
pub mod schema;
pub mod triggers;
pub mod util;

#[cfg(test)]
mod test_support;

pub use campaign::Campaign;
pub use dict::{Node, SchemaDict};
pub use error::{ConfigError, Result};
pub use schema::{SchemaCache, SchemaDocument};
