//! Error taxonomy for schema loading, schema-backed writes, and campaign composition.
//!
//! Every variant is surfaced synchronously to the immediate caller; nothing in
//! the library retries, since all operations are deterministic transformations.
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The schema file does not exist.
    #[error("schema not found: {}", path.display())]
    SchemaNotFound { path: PathBuf },

    /// The schema file exists but is not a usable schema document.
    #[error("failed to parse schema {}: {reason}", path.display())]
    SchemaParse { path: PathBuf, reason: String },

    /// A composer or session operation needed a schema before one was set.
    #[error("no schema loaded; call set_schema first")]
    SchemaNotLoaded,

    /// Unknown key or out-of-range/out-of-enum value on a schema-backed object.
    #[error("schema violation on '{key}': {reason}")]
    SchemaViolation { key: String, reason: String },

    /// Mutually exclusive construction arguments were both supplied.
    #[error("conflicting arguments: {0}")]
    ConflictingArguments(String),

    /// An object lacking the campaign event shape was added to a session.
    #[error("shape violation: {0}")]
    ShapeViolation(String),

    /// Finalize was called on an object that was already finalized.
    #[error("configuration already finalized")]
    AlreadyFinalized,

    /// The schema publishes no intervention/event class with this name.
    #[error("class '{0}' not found in schema")]
    UnknownClass(String),

    /// A caller-supplied value could not be interpreted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A default config file does not exist.
    #[error("config not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn violation(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::SchemaViolation {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}
