//! The engine driver: spawn protocol, level loading, and the frame loop.
//!
//! Each frame:
//!
//! 1. The clock paces the loop and reports the true elapsed `dt` in
//!    milliseconds.
//! 2. The event pump drains input: `Quit` ends the loop after this frame,
//!    the pause key toggles pause and updates the window title immediately.
//! 3. The surface is cleared -- with the paused color while paused, the
//!    background color otherwise.
//! 4. Unless paused, every non-frozen entity ticks, in insertion order.
//! 5. Every entity draws, in insertion order, paused or not.
//! 6. The window presents.
//!
//! Entities never see this loop. They interact with the world only through
//! the hooks the loop drives and the capability accessor attached at spawn.

use crate::platform::{InputEvent, Platform};
use crate::EngineError;
use serde::{Deserialize, Serialize};
use sprocket_core::capability::{EntityContext, Key, WindowInfo};
use sprocket_core::draw::Color;
use sprocket_core::entity::{CreationData, Entity, EntityId};
use sprocket_core::factory::EntityFactory;
use sprocket_core::registry::EntityRegistry;
use sprocket_level::level::LevelSpec;
use sprocket_level::source::LevelSource;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Engine construction parameters. Plain data; serde-capable so a config
/// can ride in JSON next to level files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Window title. Gains a `" [paused]"` suffix while paused.
    pub title: String,
    /// Window width in pixels.
    pub width: u32,
    /// Window height in pixels.
    pub height: u32,
    /// Loop pacing target. 0 disables pacing entirely.
    pub target_fps: u32,
    /// Clear color for live frames.
    pub background_color: Color,
    /// Clear color while paused; visibly distinct from the background.
    pub paused_color: Color,
    /// Key that toggles pause.
    pub pause_key: Key,
}

impl Default for EngineConfig {
    /// 800x600 at 60 fps, black background, slate paused color, P pauses.
    fn default() -> Self {
        Self {
            title: "sprocket".to_owned(),
            width: 800,
            height: 600,
            target_fps: 60,
            background_color: Color::BLACK,
            paused_color: Color::SLATE,
            pause_key: Key::P,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Owns the registry, the factory and the platform, and drives the loop.
///
/// Construction order for a typical program: register entity classes on an
/// [`EntityFactory`], build a [`Platform`] (windowed or headless), construct
/// the engine, load a level, then [`run`](Engine::run). Tests construct as
/// many engines as they like; nothing here is global.
pub struct Engine {
    config: EngineConfig,
    registry: Rc<EntityRegistry>,
    factory: EntityFactory,
    platform: Platform,
    paused: bool,
    began: bool,
    frames: u64,
}

impl Engine {
    /// Build an engine from its three ingredients and apply the configured
    /// title to the window.
    ///
    /// # Panics
    ///
    /// Panics if the configured window dimensions are zero.
    pub fn new(config: EngineConfig, factory: EntityFactory, mut platform: Platform) -> Self {
        assert!(
            config.width > 0 && config.height > 0,
            "window dimensions must be nonzero, got {}x{}",
            config.width,
            config.height
        );
        platform.window.set_title(&config.title);
        info!(
            title = %config.title,
            width = config.width,
            height = config.height,
            target_fps = config.target_fps,
            "engine constructed"
        );
        Self {
            config,
            registry: Rc::new(EntityRegistry::new()),
            factory,
            platform,
            paused: false,
            began: false,
            frames: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A handle to the live registry, for assertions and wiring outside
    /// entity hooks.
    pub fn registry(&self) -> Rc<EntityRegistry> {
        Rc::clone(&self.registry)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Total frames executed across all `run*` calls.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    // -- spawning ------------------------------------------------------------

    /// Spawn one entity. The steps happen in a fixed order: instantiate via
    /// the factory, then assign the sequential id (the pre-append registry
    /// count), the instance name and a fresh capability accessor, and only
    /// then append -- so an entity is fully initialized before any other
    /// entity can observe it.
    ///
    /// If the begin-play pass has already run, the new entity's
    /// `on_begin_play` fires immediately.
    pub fn spawn(
        &mut self,
        class_name: &str,
        entity_name: &str,
        creation_data: CreationData,
    ) -> Result<Rc<RefCell<Entity>>, EngineError> {
        let entity = self
            .factory
            .instantiate(class_name, creation_data)
            .map_err(|source| EngineError::Spawn {
                entity_name: entity_name.to_owned(),
                source,
            })?;
        let cell = self.wire_and_append(entity, entity_name, class_name);
        if self.began {
            cell.borrow_mut().begin_play();
        }
        Ok(cell)
    }

    /// Spawn every record of `level`, all-or-nothing: all behaviors are
    /// constructed first, and only if every record succeeds are entities
    /// wired and appended, in record order. On failure the registry is left
    /// exactly as it was.
    pub fn load_level(&mut self, level: &LevelSpec) -> Result<(), EngineError> {
        let mut staged = Vec::with_capacity(level.entities.len());
        for record in &level.entities {
            let entity = self
                .factory
                .instantiate(&record.class_name, record.creation_data.clone())
                .map_err(|source| EngineError::Spawn {
                    entity_name: record.name.clone(),
                    source,
                })?;
            staged.push(entity);
        }

        let mut cells = Vec::with_capacity(staged.len());
        for (entity, record) in staged.into_iter().zip(&level.entities) {
            cells.push(self.wire_and_append(entity, &record.name, &record.class_name));
        }
        info!(
            level = %level.name,
            records = level.entities.len(),
            "level loaded into registry"
        );

        if self.began {
            for cell in cells {
                cell.borrow_mut().begin_play();
            }
        }
        Ok(())
    }

    /// Fetch `name` from `source` and load it.
    pub fn load_level_from(
        &mut self,
        source: &dyn LevelSource,
        name: &str,
    ) -> Result<(), EngineError> {
        let spec = source.load(name)?;
        self.load_level(&spec)
    }

    fn wire_and_append(
        &mut self,
        mut entity: Entity,
        entity_name: &str,
        class_name: &str,
    ) -> Rc<RefCell<Entity>> {
        let id = EntityId::new(self.registry.count() as u32);
        entity.core_mut().assign_id(id);
        entity.core_mut().assign_name(entity_name);
        entity.core_mut().attach_context(self.context());
        let cell = self.registry.append(entity);
        debug!(%id, name = entity_name, class = class_name, "entity spawned");
        cell
    }

    /// A fresh capability accessor wired to the current platform and
    /// registry.
    fn context(&self) -> EntityContext {
        EntityContext::new(
            WindowInfo {
                width: self.platform.window.width(),
                height: self.platform.window.height(),
            },
            Rc::clone(&self.platform.keyboard),
            Rc::clone(&self.platform.audio),
            Rc::clone(&self.platform.fonts),
            &self.registry,
        )
    }

    // -- the loop ------------------------------------------------------------

    /// Run until a `Quit` event arrives.
    pub fn run(&mut self) {
        self.ensure_begun();
        info!(entities = self.registry.count(), "loop started");
        while self.frame() {}
        info!(frames = self.frames, "loop stopped");
    }

    /// Run at most `max_frames` frames; stops early on `Quit`. Returns the
    /// number of frames actually executed. This is how headless tests and
    /// demos drive the engine deterministically.
    pub fn run_frames(&mut self, max_frames: u64) -> u64 {
        self.ensure_begun();
        let mut executed = 0;
        while executed < max_frames {
            executed += 1;
            if !self.frame() {
                break;
            }
        }
        executed
    }

    /// First `run*` call only: drive `on_begin_play` for every live entity,
    /// in insertion order. Running after every level entity is live is what
    /// lets early entities resolve later entities by name.
    fn ensure_begun(&mut self) {
        if self.began {
            return;
        }
        self.began = true;
        for cell in self.registry.all() {
            cell.borrow_mut().begin_play();
        }
        debug!(entities = self.registry.count(), "begin-play pass complete");
    }

    /// One full frame. Returns `false` when the loop should stop; the frame
    /// that observes `Quit` still finishes (clear, draw, present) so the
    /// last presented image is consistent.
    fn frame(&mut self) -> bool {
        let dt_ms = self.platform.clock.tick(self.config.target_fps);

        let mut keep_running = true;
        for event in self.platform.events.poll_events() {
            match event {
                InputEvent::Quit => keep_running = false,
                InputEvent::KeyDown(key) if key == self.config.pause_key => self.toggle_pause(),
                InputEvent::KeyDown(_) | InputEvent::KeyUp(_) => {}
            }
        }

        let entities = self.registry.all();

        if self.paused {
            self.platform.window.surface().fill(self.config.paused_color);
        } else {
            self.platform
                .window
                .surface()
                .fill(self.config.background_color);
            for cell in &entities {
                // tick() itself skips frozen entities.
                cell.borrow_mut().tick(dt_ms);
            }
        }

        let surface = self.platform.window.surface();
        for cell in &entities {
            cell.borrow().draw(surface);
        }
        self.platform.window.present();
        self.frames += 1;
        keep_running
    }

    fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        if self.paused {
            let title = format!("{} [paused]", self.config.title);
            self.platform.window.set_title(&title);
        } else {
            self.platform.window.set_title(&self.config.title);
        }
        debug!(paused = self.paused, "pause toggled");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
