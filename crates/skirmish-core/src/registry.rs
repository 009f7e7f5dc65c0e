//! Entity registry: the shared owner of every entity in a run.
//!
//! # Two-tier locking
//!
//! The registry's reader/writer lock guards membership and iteration order
//! only. Entity fields sit behind each entity's own lock, so a role holding
//! the registry in shared mode can still mutate entities, and two roles
//! iterating concurrently never contend on field access.
//!
//! Lock rules:
//! - registry lock, then at most one entity lock at a time
//! - never acquire an entity lock while holding another entity's lock
//! - never acquire the registry lock while holding an entity lock

use std::sync::Arc;

use parking_lot::RwLock;

use crate::entity::{validate_name, Entity, EntitySnapshot};
use crate::error::ConfigError;
use crate::persistence::EntityRecord;

/// Ownership container for the entities of one simulation.
///
/// # Example
///
/// ```
/// use skirmish_core::entity::{Entity, EntityKind};
/// use skirmish_core::registry::EntityRegistry;
/// use glam::DVec2;
///
/// let registry = EntityRegistry::new();
/// registry.add(Entity::new("Arthur", EntityKind::Knight, DVec2::ZERO)).unwrap();
/// assert!(registry.add(Entity::new("Arthur", EntityKind::Elf, DVec2::ZERO)).is_err());
///
/// let alive = registry.with_entities(|entities| {
///     entities.iter().filter(|e| e.is_alive()).count()
/// });
/// assert_eq!(alive, 1);
/// ```
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: RwLock<Vec<Arc<Entity>>>,
}

impl EntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entity under exclusive access.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidName`] for a name that could not be
    /// persisted, or [`ConfigError::DuplicateName`] if an entity with the same
    /// name is already registered. The registry is left unchanged.
    pub fn add(&self, entity: Entity) -> Result<Arc<Entity>, ConfigError> {
        validate_name(entity.name())?;
        let mut entities = self.entities.write();
        if entities.iter().any(|e| e.name() == entity.name()) {
            return Err(ConfigError::DuplicateName(entity.name().to_string()));
        }
        let entity = Arc::new(entity);
        entities.push(Arc::clone(&entity));
        Ok(entity)
    }

    /// Runs `f` over the current members while holding the shared lock.
    ///
    /// Insertion and compaction wait until `f` returns. Per-entity mutation
    /// does not.
    pub fn with_entities<R>(&self, f: impl FnOnce(&[Arc<Entity>]) -> R) -> R {
        let entities = self.entities.read();
        f(&entities)
    }

    /// Returns the current members as a detached list.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<Entity>> {
        self.entities.read().clone()
    }

    /// Captures a read-only copy of every member, dead or alive.
    #[must_use]
    pub fn capture(&self) -> Vec<EntitySnapshot> {
        self.with_entities(|entities| entities.iter().map(|e| e.snapshot()).collect())
    }

    /// Records of the living members, in registry order.
    #[must_use]
    pub fn alive_records(&self) -> Vec<EntityRecord> {
        self.with_entities(|entities| {
            entities
                .iter()
                .filter(|e| e.is_alive())
                .map(|e| e.record())
                .collect()
        })
    }

    /// Drops every dead entity. Returns how many were removed.
    ///
    /// Takes the exclusive lock, so it waits for iterating roles. Meant to run
    /// between battles, not during one.
    pub fn remove_dead(&self) -> usize {
        let mut entities = self.entities.write();
        let before = entities.len();
        entities.retain(|e| e.is_alive());
        before - entities.len()
    }

    /// Looks up an entity by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Entity>> {
        self.with_entities(|entities| entities.iter().find(|e| e.name() == name).cloned())
    }

    /// Number of registered entities, dead ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.read().len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.read().is_empty()
    }

    /// Number of living entities.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.with_entities(|entities| entities.iter().filter(|e| e.is_alive()).count())
    }

    /// Removes every entity.
    pub fn clear(&self) {
        self.entities.write().clear();
    }
}
