//! Where levels come from: a loader trait plus disk-backed and in-memory
//! implementations.

use crate::level::LevelSpec;
use crate::LevelError;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{error, info};

// ---------------------------------------------------------------------------
// LevelSource
// ---------------------------------------------------------------------------

/// Loads named levels for the engine.
///
/// Implementations validate what they hand out, so a successfully loaded
/// [`LevelSpec`] never contains empty instance or class names.
pub trait LevelSource {
    fn load(&self, name: &str) -> Result<LevelSpec, LevelError>;
}

// ---------------------------------------------------------------------------
// JsonLevelSource
// ---------------------------------------------------------------------------

/// Reads `<root>/<name>.json` from disk.
#[derive(Debug, Clone)]
pub struct JsonLevelSource {
    root: PathBuf,
}

impl JsonLevelSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl LevelSource for JsonLevelSource {
    fn load(&self, name: &str) -> Result<LevelSpec, LevelError> {
        let path = self.root.join(format!("{name}.json"));
        // Named `path_text` rather than `display`: tracing's event macros
        // import `field::display` unhygienically, which would capture that name.
        let path_text = path.display().to_string();

        let text = std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                LevelError::NotFound {
                    name: name.to_owned(),
                }
            } else {
                LevelError::Io {
                    path: path_text.clone(),
                    source,
                }
            }
        })?;

        let spec: LevelSpec = serde_json::from_str(&text).map_err(|source| {
            error!(path = %path_text, %source, "level file did not parse");
            LevelError::Parse {
                path: path_text.clone(),
                source,
            }
        })?;
        spec.validate()?;

        info!(level = %spec.name, records = spec.entities.len(), path = %path_text, "level loaded");
        Ok(spec)
    }
}

// ---------------------------------------------------------------------------
// MemoryLevelSource
// ---------------------------------------------------------------------------

/// In-memory level table, for tests and demos that assemble levels in code.
#[derive(Debug, Default)]
pub struct MemoryLevelSource {
    levels: HashMap<String, LevelSpec>,
}

impl MemoryLevelSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `spec` under its own name, replacing any previous level with
    /// that name.
    pub fn insert(&mut self, spec: LevelSpec) {
        self.levels.insert(spec.name.clone(), spec);
    }

    /// Builder-style insert.
    pub fn with_level(mut self, spec: LevelSpec) -> Self {
        self.insert(spec);
        self
    }
}

impl LevelSource for MemoryLevelSource {
    fn load(&self, name: &str) -> Result<LevelSpec, LevelError> {
        let spec = self
            .levels
            .get(name)
            .cloned()
            .ok_or_else(|| LevelError::NotFound {
                name: name.to_owned(),
            })?;
        spec.validate()?;
        Ok(spec)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::EntityRecord;
    use std::io::Write;

    fn arena() -> LevelSpec {
        LevelSpec::new("arena")
            .with_entity(EntityRecord::new("Ball", "Ball"))
            .with_entity(EntityRecord::new("Left", "Paddle"))
    }

    // -- MemoryLevelSource ---------------------------------------------------

    #[test]
    fn memory_source_returns_stored_levels() {
        let source = MemoryLevelSource::new().with_level(arena());
        let spec = source.load("arena").unwrap();
        assert_eq!(spec.entities.len(), 2);
    }

    #[test]
    fn memory_source_misses_with_not_found() {
        let source = MemoryLevelSource::new();
        let err = source.load("arena").unwrap_err();
        assert!(matches!(err, LevelError::NotFound { name } if name == "arena"));
    }

    #[test]
    fn memory_source_validates_on_load() {
        let bad = LevelSpec::new("bad").with_entity(EntityRecord::new("", "Paddle"));
        let source = MemoryLevelSource::new().with_level(bad);
        let err = source.load("bad").unwrap_err();
        assert!(matches!(err, LevelError::InvalidRecord { .. }));
    }

    // -- JsonLevelSource -----------------------------------------------------

    #[test]
    fn json_source_reads_level_files() {
        let dir = tempfile::tempdir().unwrap();
        let text = serde_json::to_string(&arena()).unwrap();
        std::fs::write(dir.path().join("arena.json"), text).unwrap();

        let source = JsonLevelSource::new(dir.path());
        let spec = source.load("arena").unwrap();
        assert_eq!(spec.name, "arena");
        assert_eq!(spec.entities[1].name, "Left");
    }

    #[test]
    fn json_source_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonLevelSource::new(dir.path());
        let err = source.load("nowhere").unwrap_err();
        assert!(matches!(err, LevelError::NotFound { name } if name == "nowhere"));
    }

    #[test]
    fn json_source_garbage_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("broken.json")).unwrap();
        file.write_all(b"{ not json").unwrap();

        let source = JsonLevelSource::new(dir.path());
        let err = source.load("broken").unwrap_err();
        assert!(matches!(err, LevelError::Parse { .. }));
        assert!(err.to_string().contains("broken.json"));
    }
}
