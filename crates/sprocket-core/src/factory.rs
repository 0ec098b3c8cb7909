//! The class-name to constructor registry.
//!
//! Entity variants are statically linked and registered at startup with an
//! explicit [`EntityFactory::register_class`] call per variant, before any
//! level is loaded. There is no runtime discovery; the table is the only
//! way a class name in level data becomes a live object.

use crate::entity::{CreationData, Entity, EntityBehavior};
use crate::{CreationDataError, SpawnError};
use std::collections::HashMap;

/// Builds a behavior from creation data. Fails with the offending key named
/// when the data is malformed, so level loading can abort cleanly.
pub type EntityConstructor =
    Box<dyn Fn(&CreationData) -> Result<Box<dyn EntityBehavior>, CreationDataError>>;

// ---------------------------------------------------------------------------
// EntityFactory
// ---------------------------------------------------------------------------

/// Maps class-name strings to construction closures.
#[derive(Default)]
pub struct EntityFactory {
    constructors: HashMap<String, EntityConstructor>,
}

impl EntityFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `constructor` under `class_name`. Registering a name twice
    /// silently replaces the previous binding (last write wins).
    pub fn register_class<F>(&mut self, class_name: impl Into<String>, constructor: F)
    where
        F: Fn(&CreationData) -> Result<Box<dyn EntityBehavior>, CreationDataError> + 'static,
    {
        let class_name = class_name.into();
        let replaced = self
            .constructors
            .insert(class_name.clone(), Box::new(constructor))
            .is_some();
        if replaced {
            tracing::debug!(class = %class_name, "replaced existing entity class registration");
        } else {
            tracing::debug!(class = %class_name, "registered entity class");
        }
    }

    /// Whether `class_name` has a registered constructor.
    pub fn is_registered(&self, class_name: &str) -> bool {
        self.constructors.contains_key(class_name)
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Build an entity of class `class_name` from `creation_data`.
    ///
    /// The returned entity has no id, name or capability accessor yet;
    /// wiring it into the live world is the spawning engine's job. An
    /// unregistered name is a returned error, never a crash of the loop.
    pub fn instantiate(
        &self,
        class_name: &str,
        creation_data: CreationData,
    ) -> Result<Entity, SpawnError> {
        let constructor =
            self.constructors
                .get(class_name)
                .ok_or_else(|| SpawnError::UnknownClass {
                    class_name: class_name.to_owned(),
                    registered: self.registered_names(),
                })?;
        let behavior = constructor(&creation_data).map_err(|source| SpawnError::Construction {
            class_name: class_name.to_owned(),
            source,
        })?;
        Ok(Entity::new(behavior, creation_data))
    }

    /// Comma-joined sorted class names, for diagnostics.
    fn registered_names(&self) -> String {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names.join(", ")
    }
}

impl std::fmt::Debug for EntityFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityFactory")
            .field("classes", &self.registered_names())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
