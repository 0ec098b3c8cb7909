//! The level data model: ordered entity records under a level name.

use crate::LevelError;
use serde::{Deserialize, Serialize};
use sprocket_core::entity::CreationData;

// ---------------------------------------------------------------------------
// EntityRecord
// ---------------------------------------------------------------------------

/// One entity to spawn: its instance name, the factory class that builds
/// it, and the payload handed to the class constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(default)]
    pub creation_data: CreationData,
}

impl EntityRecord {
    pub fn new(name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class_name: class_name.into(),
            creation_data: CreationData::new(),
        }
    }

    /// Builder-style payload attachment, for levels assembled in code.
    pub fn with_data(mut self, creation_data: CreationData) -> Self {
        self.creation_data = creation_data;
        self
    }
}

// ---------------------------------------------------------------------------
// LevelSpec
// ---------------------------------------------------------------------------

/// A complete level. Record order is spawn order, so entities later in the
/// list may be looked up by name from earlier entities' begin-play hooks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSpec {
    pub name: String,
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
}

impl LevelSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: Vec::new(),
        }
    }

    /// Builder-style record append, for levels assembled in code.
    pub fn with_entity(mut self, record: EntityRecord) -> Self {
        self.entities.push(record);
        self
    }

    /// Reject records with an empty instance name or class name before the
    /// spawn path sees them. The error names the level, the record index,
    /// and the offending field.
    pub fn validate(&self) -> Result<(), LevelError> {
        for (index, record) in self.entities.iter().enumerate() {
            if record.name.is_empty() {
                return Err(LevelError::InvalidRecord {
                    level: self.name.clone(),
                    index,
                    field: "name",
                });
            }
            if record.class_name.is_empty() {
                return Err(LevelError::InvalidRecord {
                    level: self.name.clone(),
                    index,
                    field: "class",
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn level_json_deserializes_with_creation_data() {
        let text = r#"{
            "name": "arena",
            "entities": [
                { "name": "Ball", "class": "Ball",
                  "creation_data": { "speed": 300.0, "size": 12.0 } },
                { "name": "Left", "class": "Paddle" }
            ]
        }"#;

        let level: LevelSpec = serde_json::from_str(text).unwrap();
        assert_eq!(level.name, "arena");
        assert_eq!(level.entities.len(), 2);
        assert_eq!(level.entities[0].class_name, "Ball");
        assert_eq!(
            level.entities[0].creation_data.f64_value("speed").unwrap(),
            300.0
        );
        // Absent creation_data defaults to the empty payload.
        assert!(level.entities[1].creation_data.is_empty());
    }

    #[test]
    fn entities_list_is_optional() {
        let level: LevelSpec = serde_json::from_str(r#"{ "name": "empty" }"#).unwrap();
        assert!(level.entities.is_empty());
        assert!(level.validate().is_ok());
    }

    #[test]
    fn round_trips_through_json() {
        let level = LevelSpec::new("arena").with_entity(
            EntityRecord::new("Ball", "Ball")
                .with_data(CreationData::new().with("speed", json!(250.0))),
        );
        let text = serde_json::to_string(&level).unwrap();
        let back: LevelSpec = serde_json::from_str(&text).unwrap();
        assert_eq!(back, level);
    }

    #[test]
    fn validate_rejects_empty_instance_name() {
        let level = LevelSpec::new("arena")
            .with_entity(EntityRecord::new("Ball", "Ball"))
            .with_entity(EntityRecord::new("", "Paddle"));

        let err = level.validate().unwrap_err();
        match err {
            LevelError::InvalidRecord {
                level,
                index,
                field,
            } => {
                assert_eq!(level, "arena");
                assert_eq!(index, 1);
                assert_eq!(field, "name");
            }
            other => panic!("expected InvalidRecord, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_empty_class_name() {
        let level = LevelSpec::new("arena").with_entity(EntityRecord::new("Ball", ""));
        let err = level.validate().unwrap_err();
        assert!(err.to_string().contains("'class' must not be empty"));
    }
}
