//! Sprocket Engine -- frame loop driver and platform backends.
//!
//! This crate builds on [`sprocket_core`] to provide the game driver: a
//! paced frame loop that polls input, ticks every live entity and draws the
//! scene, plus the spawn protocol that wires entities into the shared
//! registry and the level loader from [`sprocket_level`]. Platforms are
//! pluggable: a recording headless backend ships here, and the `renderer`
//! feature adds a windowed wgpu/winit backend.
//!
//! # Quick Start
//!
//! ```
//! use sprocket_engine::prelude::*;
//!
//! struct Drifter;
//!
//! impl EntityBehavior for Drifter {
//!     fn on_tick(&mut self, core: &mut EntityCore, dt_ms: f64) {
//!         let position = core.position();
//!         core.set_position(position + Vec2::new(dt_ms * 0.01, 0.0));
//!     }
//! }
//!
//! let mut factory = EntityFactory::new();
//! factory.register_class("Drifter", |_data| Ok(Box::new(Drifter)));
//!
//! let handles = HeadlessPlatform::new(640, 480);
//! let mut engine = Engine::new(EngineConfig::default(), factory, handles.build());
//! engine.spawn("Drifter", "drifter_1", CreationData::new()).unwrap();
//!
//! let executed = engine.run_frames(10);
//! assert_eq!(executed, 10);
//! assert_eq!(handles.present_count(), 10);
//! ```

#![deny(unsafe_code)]

pub mod clock;
pub mod engine;
pub mod headless;
pub mod platform;
#[cfg(feature = "renderer")]
pub mod render;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by the engine driver.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A level failed to load, parse or validate.
    #[error(transparent)]
    Level(#[from] sprocket_level::LevelError),

    /// Spawning one entity failed. Carries the instance name the caller
    /// asked for, so level loads can point at the offending record.
    #[error("failed to spawn entity '{entity_name}'")]
    Spawn {
        entity_name: String,
        #[source]
        source: sprocket_core::SpawnError,
    },
}

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the object-model crate for convenience.
pub use sprocket_core;

/// Re-export the level-data crate for convenience.
pub use sprocket_level;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    // Re-export everything from the core prelude.
    pub use sprocket_core::prelude::*;

    // Engine-specific exports.
    pub use crate::clock::{FrameClock, ManualClock};
    pub use crate::engine::{Engine, EngineConfig};
    pub use crate::headless::{DrawOp, HeadlessPlatform};
    pub use crate::platform::{Clock, EventSource, InputEvent, Platform, Window};
    pub use crate::EngineError;

    // Level types for convenient access.
    pub use sprocket_level::level::{EntityRecord, LevelSpec};
    pub use sprocket_level::source::{JsonLevelSource, LevelSource, MemoryLevelSource};
    pub use sprocket_level::LevelError;
}
