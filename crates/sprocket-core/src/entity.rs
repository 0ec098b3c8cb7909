//! The polymorphic unit of simulation.
//!
//! An [`Entity`] pairs an [`EntityCore`] (identity, position, frozen flag,
//! capability accessor, creation data) with a boxed [`EntityBehavior`]
//! supplying the per-frame hooks. Concrete game objects implement
//! `EntityBehavior`; the engine owns the core and drives the hooks.
//!
//! Identity fields are set exactly once, by the engine's spawn path, in a
//! fixed order: behavior constructed from creation data, then the capability
//! accessor attached, then id and name assigned, then the entity appended to
//! the registry. Setting a field twice, or reading one before it is set, is
//! a spawn-protocol bug and panics immediately with a diagnostic naming the
//! entity.

use crate::capability::EntityContext;
use crate::collide::Aabb;
use crate::draw::Surface;
use crate::math::Vec2;
use crate::CreationDataError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A sequential entity identifier, assigned at spawn time from the registry
/// count (first entity gets 0). Never recycled; this engine has no
/// mid-session despawn.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn to_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// CreationData
// ---------------------------------------------------------------------------

/// The opaque key-value payload a level record supplies to an entity
/// constructor.
///
/// Typed getters fail with the offending key named, so a malformed record
/// aborts level loading with a useful diagnostic instead of spawning a
/// half-configured entity.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreationData(Map<String, Value>);

impl CreationData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, for levels assembled in code.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Raw access for optional keys.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Required string value.
    pub fn str_value(&self, key: &str) -> Result<&str, CreationDataError> {
        self.required(key)?
            .as_str()
            .ok_or_else(|| self.wrong_type(key, "a string"))
    }

    /// Required number value.
    pub fn f64_value(&self, key: &str) -> Result<f64, CreationDataError> {
        self.required(key)?
            .as_f64()
            .ok_or_else(|| self.wrong_type(key, "a number"))
    }

    /// Required integer value.
    pub fn i64_value(&self, key: &str) -> Result<i64, CreationDataError> {
        self.required(key)?
            .as_i64()
            .ok_or_else(|| self.wrong_type(key, "an integer"))
    }

    /// Required boolean value.
    pub fn bool_value(&self, key: &str) -> Result<bool, CreationDataError> {
        self.required(key)?
            .as_bool()
            .ok_or_else(|| self.wrong_type(key, "a boolean"))
    }

    /// Required vector value, encoded as `{"x": .., "y": ..}`.
    pub fn vec2_value(&self, key: &str) -> Result<Vec2, CreationDataError> {
        let value = self.required(key)?;
        serde_json::from_value(value.clone())
            .map_err(|_| self.wrong_type(key, "a vector object {\"x\", \"y\"}"))
    }

    fn required(&self, key: &str) -> Result<&Value, CreationDataError> {
        self.0.get(key).ok_or_else(|| CreationDataError::MissingKey {
            key: key.to_owned(),
        })
    }

    fn wrong_type(&self, key: &str, expected: &'static str) -> CreationDataError {
        let found = match self.0.get(key) {
            Some(Value::Null) => "null",
            Some(Value::Bool(_)) => "a boolean",
            Some(Value::Number(_)) => "a number",
            Some(Value::String(_)) => "a string",
            Some(Value::Array(_)) => "an array",
            Some(Value::Object(_)) => "an object",
            None => "nothing",
        };
        CreationDataError::WrongType {
            key: key.to_owned(),
            expected,
            found,
        }
    }
}

impl From<Map<String, Value>> for CreationData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// ---------------------------------------------------------------------------
// EntityBehavior
// ---------------------------------------------------------------------------

/// The per-frame hook surface a concrete game object implements.
///
/// Every hook has a default no-op body, so a behavior only overrides what
/// it uses. Hooks receive the entity's [`EntityCore`] for access to
/// position, identity and capabilities; the behavior and its core are
/// separate borrows, so a hook can freely mutate both.
pub trait EntityBehavior {
    /// Called exactly once, after every level entity is constructed and
    /// registered, before the first tick. Cross-entity wiring by name
    /// belongs here: the ordering guarantee means lookups of other
    /// level-spawned entities never miss.
    fn on_begin_play(&mut self, core: &mut EntityCore) {
        let _ = core;
    }

    /// Called once per frame unless the entity is frozen. `dt_ms` is the
    /// true elapsed milliseconds since the previous frame, not a fixed
    /// step.
    fn on_tick(&mut self, core: &mut EntityCore, dt_ms: f64) {
        let _ = (core, dt_ms);
    }

    /// Called once per frame for every live entity, frozen or not. Receives
    /// shared references only; drawing must not mutate simulation state.
    fn on_draw(&self, core: &EntityCore, surface: &mut dyn Surface) {
        let _ = (core, surface);
    }

    /// The entity-local collision shape. Defaults to the degenerate zero
    /// box, which touches nothing except boxes containing the entity's own
    /// position.
    fn bounding_box(&self) -> Aabb {
        Aabb::ZERO
    }
}

// ---------------------------------------------------------------------------
// EntityCore
// ---------------------------------------------------------------------------

/// The engine-managed half of an entity: identity, transform, frozen flag,
/// capability accessor and retained creation data.
pub struct EntityCore {
    id: Option<EntityId>,
    name: Option<String>,
    position: Vec2,
    frozen: bool,
    context: Option<EntityContext>,
    creation_data: CreationData,
}

impl EntityCore {
    fn new(creation_data: CreationData) -> Self {
        Self {
            id: None,
            name: None,
            position: Vec2::ZERO,
            frozen: false,
            context: None,
            creation_data,
        }
    }

    /// The spawn-assigned id.
    ///
    /// # Panics
    ///
    /// Panics if read before the spawn path assigned an id.
    pub fn id(&self) -> EntityId {
        match self.id {
            Some(id) => id,
            None => panic!("{}: id read before the spawn path assigned one", self.describe()),
        }
    }

    /// The spawn-assigned name, the sole lookup key.
    ///
    /// # Panics
    ///
    /// Panics if read before the spawn path assigned a name.
    pub fn name(&self) -> &str {
        match &self.name {
            Some(name) => name,
            None => panic!("{}: name read before the spawn path assigned one", self.describe()),
        }
    }

    /// Current position. Value semantics; mutate via
    /// [`EntityCore::set_position`].
    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Whether the per-frame tick is suppressed. Frozen entities are still
    /// drawn and still collidable.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    /// The capability accessor.
    ///
    /// # Panics
    ///
    /// Panics if read before the spawn path attached one.
    pub fn context(&self) -> &EntityContext {
        match &self.context {
            Some(context) => context,
            None => panic!(
                "{}: capability accessor read before the spawn path attached one",
                self.describe()
            ),
        }
    }

    /// The creation data this entity was built from.
    pub fn creation_data(&self) -> &CreationData {
        &self.creation_data
    }

    /// Assign the spawn id. Called by the spawning engine, once.
    ///
    /// # Panics
    ///
    /// Panics if an id was already assigned.
    pub fn assign_id(&mut self, id: EntityId) {
        if let Some(existing) = self.id {
            panic!(
                "{}: id already assigned ({existing}), refusing to overwrite with {id}",
                self.describe()
            );
        }
        self.id = Some(id);
    }

    /// Assign the entity name. Called by the spawning engine, once.
    ///
    /// # Panics
    ///
    /// Panics if a name was already assigned.
    pub fn assign_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.name.is_some() {
            panic!(
                "{}: name already assigned, refusing to overwrite with '{name}'",
                self.describe()
            );
        }
        self.name = Some(name);
    }

    /// Attach the capability accessor. Called by the spawning engine, once.
    ///
    /// # Panics
    ///
    /// Panics if an accessor was already attached.
    pub fn attach_context(&mut self, context: EntityContext) {
        if self.context.is_some() {
            panic!(
                "{}: capability accessor already attached, refusing to overwrite",
                self.describe()
            );
        }
        self.context = Some(context);
    }

    /// Diagnostic label using whatever identity is known so far.
    fn describe(&self) -> String {
        match (self.id, &self.name) {
            (Some(id), Some(name)) => format!("entity {id} ('{name}')"),
            (Some(id), None) => format!("entity {id}"),
            (None, Some(name)) => format!("entity '{name}'"),
            (None, None) => "unspawned entity".to_owned(),
        }
    }
}

impl fmt::Debug for EntityCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCore")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("position", &self.position)
            .field("frozen", &self.frozen)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A live game object: behavior plus engine-managed core.
///
/// Built by the [`EntityFactory`](crate::factory::EntityFactory); wired and
/// appended by the engine's spawn path. Gameplay code reaches entities
/// through `Rc<RefCell<Entity>>` cells handed out by the registry.
pub struct Entity {
    core: EntityCore,
    behavior: Box<dyn EntityBehavior>,
}

impl Entity {
    /// Pair a behavior with a fresh core retaining `creation_data`. The
    /// result has no id, name or capability accessor yet.
    pub fn new(behavior: Box<dyn EntityBehavior>, creation_data: CreationData) -> Self {
        Self {
            core: EntityCore::new(creation_data),
            behavior,
        }
    }

    pub fn core(&self) -> &EntityCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut EntityCore {
        &mut self.core
    }

    /// Shorthand for [`EntityCore::id`]. Panics on the same condition.
    pub fn id(&self) -> EntityId {
        self.core.id()
    }

    /// Shorthand for [`EntityCore::name`]. Panics on the same condition.
    pub fn name(&self) -> &str {
        self.core.name()
    }

    /// Shorthand for [`EntityCore::position`].
    pub fn position(&self) -> Vec2 {
        self.core.position()
    }

    /// Shorthand for [`EntityCore::is_frozen`].
    pub fn is_frozen(&self) -> bool {
        self.core.is_frozen()
    }

    /// Drive the begin-play hook.
    pub fn begin_play(&mut self) {
        self.behavior.on_begin_play(&mut self.core);
    }

    /// Drive the per-frame tick hook. Does nothing while the entity is
    /// frozen; freezing suppresses ticking and nothing else.
    pub fn tick(&mut self, dt_ms: f64) {
        if self.core.frozen {
            return;
        }
        self.behavior.on_tick(&mut self.core, dt_ms);
    }

    /// Drive the per-frame draw hook.
    pub fn draw(&self, surface: &mut dyn Surface) {
        self.behavior.on_draw(&self.core, surface);
    }

    /// The entity-local collision shape.
    pub fn bounding_box(&self) -> Aabb {
        self.behavior.bounding_box()
    }

    /// The collision shape translated to the current position. Derived on
    /// demand, never stored.
    pub fn positioned_bounding_box(&self) -> Aabb {
        self.behavior.bounding_box().translated(self.core.position)
    }

    /// AABB overlap test between this entity's and `other`'s positioned
    /// bounding boxes.
    pub fn collides_with(&self, other: &Entity) -> bool {
        self.positioned_bounding_box()
            .intersects(other.positioned_bounding_box())
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity").field("core", &self.core).finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Inert;

    impl EntityBehavior for Inert {}

    struct Boxy {
        shape: Aabb,
    }

    impl EntityBehavior for Boxy {
        fn bounding_box(&self) -> Aabb {
            self.shape
        }
    }

    fn inert_entity() -> Entity {
        Entity::new(Box::new(Inert), CreationData::new())
    }

    // -- set-once identity --------------------------------------------------

    #[test]
    fn fresh_entity_has_position_zero_and_is_not_frozen() {
        let entity = inert_entity();
        assert_eq!(entity.position(), Vec2::ZERO);
        assert!(!entity.is_frozen());
    }

    #[test]
    fn assigned_identity_reads_back() {
        let mut entity = inert_entity();
        entity.core_mut().assign_id(EntityId::new(3));
        entity.core_mut().assign_name("Ball");
        assert_eq!(entity.id(), EntityId::new(3));
        assert_eq!(entity.name(), "Ball");
    }

    #[test]
    #[should_panic(expected = "id already assigned")]
    fn double_id_assignment_panics() {
        let mut entity = inert_entity();
        entity.core_mut().assign_id(EntityId::new(0));
        entity.core_mut().assign_id(EntityId::new(1));
    }

    #[test]
    #[should_panic(expected = "name already assigned")]
    fn double_name_assignment_panics() {
        let mut entity = inert_entity();
        entity.core_mut().assign_name("Ball");
        entity.core_mut().assign_name("Paddle");
    }

    #[test]
    #[should_panic(expected = "id read before")]
    fn reading_unset_id_panics() {
        let entity = inert_entity();
        let _ = entity.id();
    }

    #[test]
    #[should_panic(expected = "name read before")]
    fn reading_unset_name_panics() {
        let entity = inert_entity();
        let _ = entity.name();
    }

    #[test]
    #[should_panic(expected = "capability accessor read before")]
    fn reading_unset_context_panics() {
        let entity = inert_entity();
        let _ = entity.core().context();
    }

    #[test]
    fn panic_messages_name_the_entity() {
        let mut entity = inert_entity();
        entity.core_mut().assign_id(EntityId::new(7));
        entity.core_mut().assign_name("Ball");
        let err = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            entity.core_mut().assign_name("Other");
        }))
        .unwrap_err();
        let message = err.downcast_ref::<String>().unwrap();
        assert!(message.contains("entity 7 ('Ball')"), "got: {message}");
    }

    // -- hooks and collision ------------------------------------------------

    #[test]
    fn default_hooks_are_no_ops() {
        let mut entity = inert_entity();
        entity.begin_play();
        entity.tick(16.0);
        assert_eq!(entity.bounding_box(), Aabb::ZERO);
    }

    #[test]
    fn positioned_box_follows_position() {
        let mut entity = Entity::new(
            Box::new(Boxy {
                shape: Aabb::new(0.0, 0.0, 25.0, 25.0),
            }),
            CreationData::new(),
        );
        entity.core_mut().set_position(Vec2::new(100.0, 200.0));
        assert_eq!(
            entity.positioned_bounding_box(),
            Aabb::new(100.0, 200.0, 125.0, 225.0)
        );
    }

    #[test]
    fn collides_with_uses_positioned_boxes() {
        let mut a = Entity::new(
            Box::new(Boxy {
                shape: Aabb::new(0.0, 0.0, 10.0, 10.0),
            }),
            CreationData::new(),
        );
        let mut b = Entity::new(
            Box::new(Boxy {
                shape: Aabb::new(0.0, 0.0, 10.0, 10.0),
            }),
            CreationData::new(),
        );
        a.core_mut().set_position(Vec2::new(0.0, 0.0));
        b.core_mut().set_position(Vec2::new(5.0, 5.0));
        assert!(a.collides_with(&b));

        b.core_mut().set_position(Vec2::new(50.0, 50.0));
        assert!(!a.collides_with(&b));
    }

    #[test]
    fn frozen_flag_toggles() {
        let mut entity = inert_entity();
        entity.core_mut().set_frozen(true);
        assert!(entity.is_frozen());
        entity.core_mut().set_frozen(false);
        assert!(!entity.is_frozen());
    }

    #[test]
    fn frozen_suppresses_tick_until_unfrozen() {
        struct Pulse {
            ticks: std::rc::Rc<std::cell::Cell<u32>>,
        }

        impl EntityBehavior for Pulse {
            fn on_tick(&mut self, _core: &mut EntityCore, _dt_ms: f64) {
                self.ticks.set(self.ticks.get() + 1);
            }
        }

        let ticks = std::rc::Rc::new(std::cell::Cell::new(0));
        let mut entity = Entity::new(
            Box::new(Pulse {
                ticks: std::rc::Rc::clone(&ticks),
            }),
            CreationData::new(),
        );

        entity.tick(16.0);
        assert_eq!(ticks.get(), 1);

        entity.core_mut().set_frozen(true);
        entity.tick(16.0);
        entity.tick(16.0);
        assert_eq!(ticks.get(), 1, "frozen entity never sees the tick hook");

        entity.core_mut().set_frozen(false);
        entity.tick(16.0);
        assert_eq!(ticks.get(), 2);
    }

    // -- creation data ------------------------------------------------------

    #[test]
    fn typed_getters_read_values() {
        let data = CreationData::new()
            .with("side", json!("left"))
            .with("speed", json!(0.5))
            .with("lives", json!(3))
            .with("solid", json!(true))
            .with("spawn", json!({"x": 10.0, "y": 20.0}));
        assert_eq!(data.str_value("side").unwrap(), "left");
        assert_eq!(data.f64_value("speed").unwrap(), 0.5);
        assert_eq!(data.i64_value("lives").unwrap(), 3);
        assert!(data.bool_value("solid").unwrap());
        assert_eq!(data.vec2_value("spawn").unwrap(), Vec2::new(10.0, 20.0));
    }

    #[test]
    fn missing_key_is_reported_by_name() {
        let data = CreationData::new();
        let err = data.str_value("side").unwrap_err();
        assert!(err.to_string().contains("'side'"), "got: {err}");
    }

    #[test]
    fn wrong_type_reports_expected_and_found() {
        let data = CreationData::new().with("speed", json!("fast"));
        let err = data.f64_value("speed").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("a number"), "got: {text}");
        assert!(text.contains("a string"), "got: {text}");
    }

    #[test]
    fn entity_retains_its_creation_data() {
        let data = CreationData::new().with("side", json!("right"));
        let entity = Entity::new(Box::new(Inert), data.clone());
        assert_eq!(entity.core().creation_data(), &data);
    }

    #[test]
    fn creation_data_round_trips_through_json() {
        let data = CreationData::new().with("speed", json!(0.5));
        let text = serde_json::to_string(&data).unwrap();
        let back: CreationData = serde_json::from_str(&text).unwrap();
        assert_eq!(back, data);
    }
}
