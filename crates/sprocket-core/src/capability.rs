//! Capability interfaces granted to entities, and the [`EntityContext`]
//! accessor that bundles them.
//!
//! Entities never hold a reference to the engine. At spawn time each entity
//! receives an `EntityContext` exposing exactly what gameplay code needs:
//! window metrics, keyboard polling, sound and font loading, and the entity
//! registry for name lookups. Coupling stays one-directional; the engine
//! knows its entities, entities only know this accessor.

use crate::draw::Font;
use crate::registry::EntityRegistry;
use crate::CapabilityError;
use std::fmt;
use std::rc::{Rc, Weak};

// ---------------------------------------------------------------------------
// Keyboard
// ---------------------------------------------------------------------------

/// Keys the engine recognizes. Backends map their native key codes onto
/// this set; unmapped keys are dropped at the backend boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    W,
    A,
    S,
    D,
    P,
    Space,
    Enter,
    Escape,
}

/// Synchronously polled keyboard state.
pub trait KeyboardState {
    fn is_pressed(&self, key: Key) -> bool;
}

// ---------------------------------------------------------------------------
// Sound
// ---------------------------------------------------------------------------

/// Backend half of the sound capability: routes playback requests for the
/// handles it minted. Implemented by audio backends, never by gameplay code.
pub trait SoundBackend {
    fn play(&self, id: u64);
    fn stop(&self, id: u64);
}

/// A playable handle returned by [`SoundProvider::load_sound`].
#[derive(Clone)]
pub struct Sound {
    id: u64,
    backend: Rc<dyn SoundBackend>,
}

impl Sound {
    pub fn new(id: u64, backend: Rc<dyn SoundBackend>) -> Self {
        Self { id, backend }
    }

    pub fn play(&self) {
        self.backend.play(self.id);
    }

    pub fn stop(&self) {
        self.backend.stop(self.id);
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Debug for Sound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Sound").field(&self.id).finish()
    }
}

/// Loads sounds by path relative to the backend's asset root.
pub trait SoundProvider {
    fn load_sound(&self, relative_path: &str) -> Result<Sound, CapabilityError>;
}

// ---------------------------------------------------------------------------
// Fonts
// ---------------------------------------------------------------------------

/// Mints [`Font`] handles, either from a file path relative to the
/// backend's asset root or from an installed system face.
pub trait FontProvider {
    fn load_font(&self, relative_path: &str, size: u32) -> Result<Font, CapabilityError>;

    fn load_system_font(&self, name: &str, size: u32) -> Result<Font, CapabilityError>;
}

// ---------------------------------------------------------------------------
// EntityContext
// ---------------------------------------------------------------------------

/// Window metrics as entities see them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowInfo {
    pub width: u32,
    pub height: u32,
}

/// The capability accessor handed to every entity at spawn time.
///
/// Cheap to clone; the engine builds a fresh one per entity. The registry
/// reference is weak so entities never keep the registry alive past the
/// engine's lifetime.
#[derive(Clone)]
pub struct EntityContext {
    window: WindowInfo,
    keyboard: Rc<dyn KeyboardState>,
    audio: Rc<dyn SoundProvider>,
    fonts: Rc<dyn FontProvider>,
    entities: Weak<EntityRegistry>,
}

impl EntityContext {
    pub fn new(
        window: WindowInfo,
        keyboard: Rc<dyn KeyboardState>,
        audio: Rc<dyn SoundProvider>,
        fonts: Rc<dyn FontProvider>,
        entities: &Rc<EntityRegistry>,
    ) -> Self {
        Self {
            window,
            keyboard,
            audio,
            fonts,
            entities: Rc::downgrade(entities),
        }
    }

    /// Window width in pixels.
    pub fn window_width(&self) -> u32 {
        self.window.width
    }

    /// Window height in pixels.
    pub fn window_height(&self) -> u32 {
        self.window.height
    }

    /// Poll a key's current state.
    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.keyboard.is_pressed(key)
    }

    /// Load a sound by path relative to the platform's asset root.
    pub fn load_sound(&self, relative_path: &str) -> Result<Sound, CapabilityError> {
        self.audio.load_sound(relative_path)
    }

    /// Load a font face from a file.
    pub fn load_font(&self, relative_path: &str, size: u32) -> Result<Font, CapabilityError> {
        self.fonts.load_font(relative_path, size)
    }

    /// Load an installed system font face.
    pub fn load_system_font(&self, name: &str, size: u32) -> Result<Font, CapabilityError> {
        self.fonts.load_system_font(name, size)
    }

    /// The live entity registry, for name lookup and enumeration.
    ///
    /// An entity's own cell is exclusively borrowed while one of its hooks
    /// runs, so an entity must not look *itself* up here mid-hook; looking
    /// up other entities is the supported pattern.
    ///
    /// # Panics
    ///
    /// Panics if the registry has been dropped, which only happens when an
    /// entity outlives its engine -- a teardown-order bug.
    pub fn entities(&self) -> Rc<EntityRegistry> {
        self.entities
            .upgrade()
            .unwrap_or_else(|| panic!("entity registry dropped while a capability accessor is still in use"))
    }
}

impl fmt::Debug for EntityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityContext")
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct NoKeys;

    impl KeyboardState for NoKeys {
        fn is_pressed(&self, _key: Key) -> bool {
            false
        }
    }

    #[derive(Default)]
    struct CountingBackend {
        plays: RefCell<Vec<u64>>,
        stops: RefCell<Vec<u64>>,
    }

    impl SoundBackend for CountingBackend {
        fn play(&self, id: u64) {
            self.plays.borrow_mut().push(id);
        }

        fn stop(&self, id: u64) {
            self.stops.borrow_mut().push(id);
        }
    }

    struct OneShotSounds {
        backend: Rc<CountingBackend>,
    }

    impl SoundProvider for OneShotSounds {
        fn load_sound(&self, _relative_path: &str) -> Result<Sound, CapabilityError> {
            Ok(Sound::new(42, Rc::clone(&self.backend) as Rc<dyn SoundBackend>))
        }
    }

    struct FixedFonts;

    impl FontProvider for FixedFonts {
        fn load_font(&self, _relative_path: &str, size: u32) -> Result<Font, CapabilityError> {
            Ok(Font::new(0, size))
        }

        fn load_system_font(&self, _name: &str, size: u32) -> Result<Font, CapabilityError> {
            Ok(Font::new(1, size))
        }
    }

    fn context(registry: &Rc<EntityRegistry>, backend: Rc<CountingBackend>) -> EntityContext {
        EntityContext::new(
            WindowInfo {
                width: 640,
                height: 480,
            },
            Rc::new(NoKeys),
            Rc::new(OneShotSounds { backend }),
            Rc::new(FixedFonts),
            registry,
        )
    }

    #[test]
    fn window_metrics_pass_through() {
        let registry = Rc::new(EntityRegistry::new());
        let ctx = context(&registry, Rc::new(CountingBackend::default()));
        assert_eq!(ctx.window_width(), 640);
        assert_eq!(ctx.window_height(), 480);
    }

    #[test]
    fn sound_handle_routes_to_its_backend() {
        let registry = Rc::new(EntityRegistry::new());
        let backend = Rc::new(CountingBackend::default());
        let ctx = context(&registry, Rc::clone(&backend));

        let sound = ctx.load_sound("bounce.wav").unwrap();
        sound.play();
        sound.play();
        sound.stop();
        assert_eq!(*backend.plays.borrow(), vec![42, 42]);
        assert_eq!(*backend.stops.borrow(), vec![42]);
    }

    #[test]
    fn font_loading_passes_size_through() {
        let registry = Rc::new(EntityRegistry::new());
        let ctx = context(&registry, Rc::new(CountingBackend::default()));
        assert_eq!(ctx.load_font("arcade.ttf", 24).unwrap().size(), 24);
        assert_eq!(ctx.load_system_font("monospace", 16).unwrap().size(), 16);
    }

    #[test]
    fn entities_returns_the_live_registry() {
        let registry = Rc::new(EntityRegistry::new());
        let ctx = context(&registry, Rc::new(CountingBackend::default()));
        assert_eq!(ctx.entities().count(), 0);
        assert!(Rc::ptr_eq(&ctx.entities(), &registry));
    }

    #[test]
    #[should_panic(expected = "registry dropped")]
    fn entities_panics_after_registry_teardown() {
        let registry = Rc::new(EntityRegistry::new());
        let ctx = context(&registry, Rc::new(CountingBackend::default()));
        drop(registry);
        let _ = ctx.entities();
    }
}
