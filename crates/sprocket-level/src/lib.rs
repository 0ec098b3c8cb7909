//! Sprocket Level - Declarative level data for the Sprocket engine.
//!
//! A level is a named, ordered list of entity records; each record carries
//! an instance name, a factory class, and an opaque creation-data payload.
//! The engine spawns records in order, so levels double as a spawn script.
//!
//! # Modules
//!
//! - [`level`]: the [`level::LevelSpec`] / [`level::EntityRecord`] data
//!   model, serde (de)serializable, JSON on disk.
//! - [`source`]: the [`source::LevelSource`] loader trait with a
//!   directory-backed JSON implementation and an in-memory one for tests
//!   and demos.

#![deny(unsafe_code)]

pub mod level;
pub mod source;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while locating, reading or validating level data.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    /// No level with the requested name exists in the source.
    #[error("level '{name}' not found")]
    NotFound {
        name: String,
    },

    /// Reading the level file failed.
    #[error("failed to read level file '{path}'")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but does not parse as level JSON.
    #[error("failed to parse level file '{path}'")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A record is structurally present but unusable.
    #[error("level '{level}' record {index}: '{field}' must not be empty")]
    InvalidRecord {
        level: String,
        index: usize,
        field: &'static str,
    },
}
