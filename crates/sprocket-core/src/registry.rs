//! The live entity collection.
//!
//! The registry is the sole owner of live entities; entities never outlive
//! it. The engine holds it as `Rc<EntityRegistry>` and capability accessors
//! keep `Weak` back-references, so ownership is a tree, not a cycle.
//!
//! Iteration order is insertion order, always. The frame loop relies on
//! this for deterministic tick/draw ordering, and gameplay code relies on
//! it for first-match name lookup.

use crate::entity::Entity;
use std::cell::RefCell;
use std::rc::Rc;

// ---------------------------------------------------------------------------
// EntityRegistry
// ---------------------------------------------------------------------------

/// One registered entity. The name is captured at append time so lookups
/// never borrow the entity cells; names are set-once, so the copy cannot go
/// stale.
#[derive(Debug)]
struct Entry {
    name: String,
    cell: Rc<RefCell<Entity>>,
}

/// Insertion-ordered store of live entities.
///
/// Entities are kept in `Rc<RefCell<_>>` cells so that one entity's hook
/// can read other entities mid-frame. Name lookup scans the names captured
/// at append time and touches no cell, which lets an entity resolve
/// neighbors from inside its own hooks while its cell is exclusively
/// borrowed.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entries: RefCell<Vec<Entry>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fully wired entity and return its live cell.
    ///
    /// O(1) amortized. The entity is visible to all subsequent iteration
    /// and lookup. Structural mutation happens only here, on the engine's
    /// spawn path, conceptually between frames.
    ///
    /// # Panics
    ///
    /// Panics if the entity's name has not been assigned; the spawn path
    /// assigns identity before appending.
    pub fn append(&self, entity: Entity) -> Rc<RefCell<Entity>> {
        let name = entity.name().to_owned();
        let cell = Rc::new(RefCell::new(entity));
        self.entries.borrow_mut().push(Entry {
            name,
            cell: Rc::clone(&cell),
        });
        tracing::trace!(count = self.count(), "entity appended to registry");
        cell
    }

    /// Number of live entities, which the spawn path reads (pre-append) to
    /// assign the next sequential id.
    pub fn count(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Snapshot of the live entities in insertion order.
    ///
    /// The returned vector is independent of the registry, so iterating it
    /// stays safe while entities query the registry or each other.
    pub fn all(&self) -> Vec<Rc<RefCell<Entity>>> {
        self.entries
            .borrow()
            .iter()
            .map(|entry| Rc::clone(&entry.cell))
            .collect()
    }

    /// Linear scan for the first entity (in insertion order) whose name is
    /// `name`. `None` if absent.
    ///
    /// Lookup misses are expected only transiently, before the begin-play
    /// ordering guarantee kicks in; after that phase callers treat a miss
    /// as a logic error.
    pub fn get_by_name(&self, name: &str) -> Option<Rc<RefCell<Entity>>> {
        self.entries
            .borrow()
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| Rc::clone(&entry.cell))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
