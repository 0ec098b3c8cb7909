//! Sprocket Core -- object model for a fixed-tick 2D entity engine.
//!
//! This crate provides the pieces an entity-based game is assembled from:
//! plain math and collision types ([`math::Vec2`], [`collide::Aabb`]),
//! wall-clock widgets ([`timing::Timer`], [`timing::Alternator`]), the
//! entity object model itself ([`entity::Entity`], [`entity::EntityBehavior`]),
//! the insertion-ordered [`registry::EntityRegistry`], and the name-keyed
//! [`factory::EntityFactory`] that instantiates behaviors from level data.
//! Entities reach the outside world (window, keyboard, audio, fonts, other
//! entities) only through the [`capability::EntityContext`] handed to them
//! at spawn time.
//!
//! # Quick Start
//!
//! ```
//! use sprocket_core::prelude::*;
//! use std::rc::Rc;
//!
//! struct Blip;
//!
//! impl EntityBehavior for Blip {
//!     fn bounding_box(&self) -> Aabb {
//!         Aabb::new(0.0, 0.0, 16.0, 16.0)
//!     }
//! }
//!
//! let mut factory = EntityFactory::new();
//! factory.register_class("Blip", |_data| Ok(Box::new(Blip)));
//!
//! let mut entity = factory.instantiate("Blip", CreationData::new()).unwrap();
//! entity.core_mut().assign_id(EntityId::new(0));
//! entity.core_mut().assign_name("First");
//!
//! let registry = Rc::new(EntityRegistry::new());
//! registry.append(entity);
//!
//! let found = registry.get_by_name("First").expect("just appended");
//! assert_eq!(found.borrow().id(), EntityId::new(0));
//! ```

#![deny(unsafe_code)]

pub mod capability;
pub mod collide;
pub mod draw;
pub mod entity;
pub mod factory;
pub mod math;
pub mod registry;
pub mod timing;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced when an [`capability::EntityContext`] accessor cannot
/// deliver the requested capability.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    /// The named asset file does not exist.
    #[error("asset '{path}' not found")]
    AssetNotFound {
        path: String,
    },

    /// Reading the asset failed after it was found.
    #[error("failed to read asset '{path}'")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The active backend does not implement the requested capability.
    #[error("capability not supported by this backend: {what}")]
    Unsupported {
        what: String,
    },
}

/// Errors produced by the typed getters on [`entity::CreationData`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CreationDataError {
    /// A key the constructor requires is absent from the payload.
    #[error("creation data has no value for key '{key}'")]
    MissingKey {
        key: String,
    },

    /// The key is present but holds a value of the wrong JSON type.
    #[error("creation data key '{key}' expected {expected}, found {found}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Errors produced when [`factory::EntityFactory::instantiate`] cannot
/// produce an entity.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    /// The class name has never been registered with the factory.
    #[error("entity class '{class_name}' not registered. Registered classes: [{registered}]")]
    UnknownClass {
        class_name: String,
        registered: String,
    },

    /// The registered constructor rejected the creation data.
    #[error("constructor for class '{class_name}' failed")]
    Construction {
        class_name: String,
        #[source]
        source: CreationDataError,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::capability::{
        EntityContext, FontProvider, Key, KeyboardState, Sound, SoundBackend, SoundProvider,
        WindowInfo,
    };
    pub use crate::collide::Aabb;
    pub use crate::draw::{Color, Font, Surface};
    pub use crate::entity::{CreationData, Entity, EntityBehavior, EntityCore, EntityId};
    pub use crate::factory::EntityFactory;
    pub use crate::math::Vec2;
    pub use crate::registry::EntityRegistry;
    pub use crate::timing::{Alternator, ManualTime, MonotonicTime, TimeSource, Timer};
    pub use crate::{CapabilityError, CreationDataError, SpawnError};
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    // -- test behaviors -----------------------------------------------------

    /// Moves right at a fixed speed and remembers how often it ticked.
    struct Walker {
        speed: f64,
        ticks: Rc<Cell<u32>>,
    }

    impl EntityBehavior for Walker {
        fn on_tick(&mut self, core: &mut EntityCore, dt_ms: f64) {
            self.ticks.set(self.ticks.get() + 1);
            let step = Vec2::new(self.speed * dt_ms / 1000.0, 0.0);
            core.set_position(core.position() + step);
        }

        fn bounding_box(&self) -> Aabb {
            Aabb::new(0.0, 0.0, 10.0, 10.0)
        }
    }

    struct Wall;

    impl EntityBehavior for Wall {
        fn bounding_box(&self) -> Aabb {
            Aabb::new(0.0, 0.0, 20.0, 200.0)
        }
    }

    fn walker_factory(ticks: Rc<Cell<u32>>) -> EntityFactory {
        let mut factory = EntityFactory::new();
        factory.register_class("Walker", move |data| {
            Ok(Box::new(Walker {
                speed: data.f64_value("speed")?,
                ticks: Rc::clone(&ticks),
            }))
        });
        factory.register_class("Wall", |_data| Ok(Box::new(Wall)));
        factory
    }

    // -- factory / registry integration -------------------------------------

    #[test]
    fn instantiate_assign_append_and_find() {
        let ticks = Rc::new(Cell::new(0));
        let factory = walker_factory(Rc::clone(&ticks));

        let data = CreationData::new().with("speed", json!(100.0));
        let mut entity = factory.instantiate("Walker", data).unwrap();
        entity.core_mut().assign_id(EntityId::new(0));
        entity.core_mut().assign_name("Hero");

        let registry = Rc::new(EntityRegistry::new());
        registry.append(entity);

        let found = registry.get_by_name("Hero").expect("appended above");
        assert_eq!(found.borrow().name(), "Hero");
        assert_eq!(found.borrow().id(), EntityId::new(0));
    }

    #[test]
    fn tick_moves_walker_but_skips_frozen() {
        let ticks = Rc::new(Cell::new(0));
        let factory = walker_factory(Rc::clone(&ticks));

        let data = CreationData::new().with("speed", json!(100.0));
        let mut entity = factory.instantiate("Walker", data).unwrap();

        // One second of movement at 100 px/s.
        entity.tick(1000.0);
        assert_eq!(entity.position(), Vec2::new(100.0, 0.0));
        assert_eq!(ticks.get(), 1);

        // Frozen entities keep their position and never see the hook.
        entity.core_mut().set_frozen(true);
        entity.tick(1000.0);
        assert_eq!(entity.position(), Vec2::new(100.0, 0.0));
        assert_eq!(ticks.get(), 1);
    }

    #[test]
    fn positioned_boxes_drive_collision() {
        let ticks = Rc::new(Cell::new(0));
        let factory = walker_factory(ticks);

        let data = CreationData::new().with("speed", json!(0.0));
        let mut walker = factory.instantiate("Walker", data).unwrap();
        let mut wall = factory.instantiate("Wall", CreationData::new()).unwrap();
        wall.core_mut().set_position(Vec2::new(100.0, 0.0));

        assert!(!walker.collides_with(&wall), "90 px apart");

        walker.core_mut().set_position(Vec2::new(95.0, 0.0));
        assert!(walker.collides_with(&wall), "boxes overlap by 5 px");
        assert!(wall.collides_with(&walker), "collision is symmetric");
    }

    #[test]
    fn unknown_class_lists_registered_names() {
        let ticks = Rc::new(Cell::new(0));
        let factory = walker_factory(ticks);

        let err = factory
            .instantiate("Ghost", CreationData::new())
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'Ghost'"), "message was: {message}");
        assert!(message.contains("Walker"), "message was: {message}");
        assert!(message.contains("Wall"), "message was: {message}");
    }

    #[test]
    fn construction_error_names_class_and_key() {
        let ticks = Rc::new(Cell::new(0));
        let factory = walker_factory(ticks);

        // Walker requires "speed"; give it nothing.
        let err = factory
            .instantiate("Walker", CreationData::new())
            .unwrap_err();
        assert!(matches!(err, SpawnError::Construction { .. }));
        let message = err.to_string();
        assert!(message.contains("'Walker'"), "message was: {message}");
    }

    // -- timing integration --------------------------------------------------

    #[test]
    fn timer_and_alternator_share_a_manual_clock() {
        let time = ManualTime::new();
        let fired = Rc::new(Cell::new(false));
        let fired_flag = Rc::clone(&fired);

        let mut timer =
            Timer::with_time_source(500.0, move || fired_flag.set(true), time.clone());
        let mut blink = Alternator::with_time_source(100.0, 2, time.clone());

        timer.start();
        blink.start();
        assert!(!blink.visible(), "blink starts hidden");

        time.advance(101.0);
        timer.update();
        blink.update();
        assert!(!fired.get(), "timer fires at 500 ms, not 101 ms");
        assert!(blink.visible(), "first toggle lands at just past 100 ms");

        time.advance(400.0);
        timer.update();
        assert!(fired.get(), "timer fires once 500 ms have elapsed");
    }
}
