//! Entity module: the mutable combat units shared across roles.
//!
//! This module provides:
//! - [`EntityKind`]: the closed set of unit kinds and their constants
//! - [`Entity`]: a named unit whose mutable state sits behind its own lock
//! - [`EntityState`]: a consistent copy of that mutable state
//! - [`Descriptor`]: name + kind, as carried by kill events
//! - [`EntitySnapshot`]: a full read-only copy for reports and rendering
//!
//! # Locking
//!
//! Each entity guards position, health and the alive flag with one private
//! mutex. Every accessor takes that lock briefly and releases it before
//! returning, so no caller ever holds two entity locks at once. Name and kind
//! never change and are read without locking.
//!
//! # Example
//!
//! ```
//! use skirmish_core::entity::{Entity, EntityKind};
//! use glam::DVec2;
//!
//! let a = Entity::new("Arthur", EntityKind::Knight, DVec2::new(0.0, 0.0));
//! let b = Entity::new("Merlin", EntityKind::Druid, DVec2::new(3.0, 4.0));
//!
//! assert_eq!(a.distance_to(&b), 5.0);
//! assert!(a.is_alive());
//! assert_eq!(a.health(), 100);
//! ```

mod kind;

use std::fmt;
use std::ptr;

use glam::DVec2;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::map::MapBounds;
use crate::persistence::EntityRecord;

pub use kind::{EntityKind, KindStats};

/// Mutable fields of an entity, copied out under its lock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// Current position.
    pub position: DVec2,
    /// Remaining health. May drop to zero or below.
    pub health: i32,
    /// Whether the entity is still in play. Never returns to `true`.
    pub alive: bool,
}

/// Name and kind of an entity, as reported in kill events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Descriptor {
    /// Entity name.
    pub name: String,
    /// Entity kind.
    pub kind: EntityKind,
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}

/// Read-only copy of everything observable about an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Entity name.
    pub name: String,
    /// Entity kind.
    pub kind: EntityKind,
    /// Position at capture time.
    pub position: DVec2,
    /// Health at capture time.
    pub health: i32,
    /// Alive flag at capture time.
    pub alive: bool,
}

/// Checks that `name` survives the record text form: non-empty and free of
/// whitespace.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidName`] otherwise.
pub fn validate_name(name: &str) -> Result<(), ConfigError> {
    let reason = if name.is_empty() {
        "must not be empty"
    } else if name.chars().any(char::is_whitespace) {
        "must not contain whitespace"
    } else {
        return Ok(());
    };
    Err(ConfigError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

/// A combat unit on the map.
///
/// # Invariants
///
/// - `health` and `alive` change together under one lock acquisition
/// - once `alive` is `false` it stays `false`
/// - positions produced by [`move_by`](Self::move_by) lie inside the bounds given
pub struct Entity {
    name: String,
    kind: EntityKind,
    state: Mutex<EntityState>,
}

impl Entity {
    /// Creates a living entity with its kind's base health.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: EntityKind, position: DVec2) -> Self {
        Self {
            name: name.into(),
            kind,
            state: Mutex::new(EntityState {
                position,
                health: kind.stats().base_health,
                alive: true,
            }),
        }
    }

    /// Returns the entity's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the entity's kind.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Returns the fixed constants of this entity's kind.
    #[must_use]
    pub const fn stats(&self) -> KindStats {
        self.kind.stats()
    }

    /// Returns a consistent copy of the mutable state.
    #[must_use]
    pub fn state(&self) -> EntityState {
        *self.state.lock()
    }

    /// Returns the current position.
    #[must_use]
    pub fn position(&self) -> DVec2 {
        self.state.lock().position
    }

    /// Returns the current health.
    #[must_use]
    pub fn health(&self) -> i32 {
        self.state.lock().health
    }

    /// Returns `true` while the entity is in play.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.state.lock().alive
    }

    /// Moves by `delta`, then clamps the result into `bounds`.
    pub fn move_by(&self, delta: DVec2, bounds: &MapBounds) {
        let mut state = self.state.lock();
        state.position = bounds.clamp(state.position + delta);
    }

    /// Subtracts `amount` from health and marks the entity dead at zero or below.
    ///
    /// Returns `true` only for the call that caused the death. Damage to an
    /// already dead entity is ignored.
    pub fn take_damage(&self, amount: i32) -> bool {
        let mut state = self.state.lock();
        if !state.alive {
            return false;
        }
        state.health -= amount;
        if state.health <= 0 {
            state.alive = false;
            return true;
        }
        false
    }

    /// Marks the entity dead regardless of health.
    ///
    /// Returns `true` if this call performed the transition, `false` if the
    /// entity was already dead.
    pub fn kill(&self) -> bool {
        let mut state = self.state.lock();
        let was_alive = state.alive;
        state.alive = false;
        was_alive
    }

    /// Euclidean distance to `other`.
    ///
    /// The two positions are read one after the other, each under its own
    /// lock, never nested. Distance to self is zero and takes no lock.
    #[must_use]
    pub fn distance_to(&self, other: &Entity) -> f64 {
        if ptr::eq(self, other) {
            return 0.0;
        }
        let here = self.position();
        let there = other.position();
        here.distance(there)
    }

    /// Returns the name and kind of this entity.
    #[must_use]
    pub fn descriptor(&self) -> Descriptor {
        Descriptor {
            name: self.name.clone(),
            kind: self.kind,
        }
    }

    /// Captures a full read-only copy.
    #[must_use]
    pub fn snapshot(&self) -> EntitySnapshot {
        let state = self.state();
        EntitySnapshot {
            name: self.name.clone(),
            kind: self.kind,
            position: state.position,
            health: state.health,
            alive: state.alive,
        }
    }

    /// Returns the persistable record (kind, name, position).
    #[must_use]
    pub fn record(&self) -> EntityRecord {
        let position = self.position();
        EntityRecord {
            kind: self.kind,
            name: self.name.clone(),
            x: position.x,
            y: position.y,
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn knight_at(x: f64, y: f64) -> Entity {
        Entity::new("K", EntityKind::Knight, DVec2::new(x, y))
    }

    mod construction_tests {
        use super::*;

        #[test]
        fn starts_alive_with_base_health() {
            for kind in EntityKind::ALL {
                let e = Entity::new("x", kind, DVec2::ZERO);
                assert!(e.is_alive());
                assert_eq!(e.health(), kind.stats().base_health);
                assert_eq!(e.kind(), kind);
            }
        }

        #[test]
        fn names_must_fit_one_record_field() {
            assert!(validate_name("Arthur").is_ok());
            assert!(validate_name("Knight_12").is_ok());
            for bad in ["", "Sir Arthur", "tab\tname", "trailing\n"] {
                assert!(
                    matches!(validate_name(bad), Err(ConfigError::InvalidName { .. })),
                    "{bad:?} accepted"
                );
            }
        }

        #[test]
        fn descriptor_display() {
            let e = Entity::new("Arthur", EntityKind::Knight, DVec2::ZERO);
            assert_eq!(e.descriptor().to_string(), "Arthur (Knight)");
        }

        #[test]
        fn record_carries_position() {
            let e = Entity::new("Legolas", EntityKind::Elf, DVec2::new(1.5, 2.5));
            let record = e.record();
            assert_eq!(record.kind, EntityKind::Elf);
            assert_eq!(record.name, "Legolas");
            assert_eq!((record.x, record.y), (1.5, 2.5));
        }
    }

    mod distance_tests {
        use super::*;

        #[test]
        fn three_four_five() {
            let a = knight_at(0.0, 0.0);
            let b = Entity::new("D", EntityKind::Druid, DVec2::new(3.0, 4.0));
            assert_eq!(a.distance_to(&b), 5.0);
        }

        #[test]
        fn self_distance_is_zero() {
            let a = knight_at(17.0, 3.0);
            assert_eq!(a.distance_to(&a), 0.0);
        }

        #[test]
        fn large_distance() {
            let a = knight_at(0.0, 0.0);
            let b = Entity::new("E", EntityKind::Elf, DVec2::new(500.0, 500.0));
            assert!((a.distance_to(&b) - 707.1067).abs() < 0.001);
        }
    }

    mod movement_tests {
        use super::*;

        #[test]
        fn clamps_to_map_bounds() {
            let bounds = MapBounds::new(100.0, 100.0);
            let k = knight_at(50.0, 50.0);

            k.move_by(DVec2::new(1000.0, 1000.0), &bounds);
            assert_eq!(k.position(), DVec2::new(100.0, 100.0));

            k.move_by(DVec2::new(-1000.0, -1000.0), &bounds);
            assert_eq!(k.position(), DVec2::ZERO);
        }

        #[test]
        fn small_move_is_exact() {
            let bounds = MapBounds::new(100.0, 100.0);
            let k = knight_at(10.0, 10.0);
            k.move_by(DVec2::new(2.5, -4.0), &bounds);
            assert_eq!(k.position(), DVec2::new(12.5, 6.0));
        }
    }

    mod lifecycle_tests {
        use super::*;

        #[test]
        fn damage_below_zero_kills() {
            let k = knight_at(0.0, 0.0);
            assert!(!k.take_damage(30));
            assert_eq!(k.health(), 70);
            assert!(k.is_alive());

            assert!(!k.take_damage(69));
            assert!(k.take_damage(1));
            assert_eq!(k.health(), 0);
            assert!(!k.is_alive());
        }

        #[test]
        fn damage_to_dead_entity_is_ignored() {
            let k = knight_at(0.0, 0.0);
            assert!(k.kill());
            assert!(!k.take_damage(500));
            assert_eq!(k.health(), 100);
            assert!(!k.is_alive());
        }

        #[test]
        fn kill_bypasses_health() {
            let e = Entity::new("E", EntityKind::Elf, DVec2::ZERO);
            assert!(e.kill());
            assert!(!e.is_alive());
            assert_eq!(e.health(), 70);
        }

        #[test]
        fn kill_reports_transition_once() {
            let e = Entity::new("E", EntityKind::Elf, DVec2::ZERO);
            assert!(e.kill());
            assert!(!e.kill());
            assert!(!e.is_alive());
        }

        #[test]
        fn state_is_consistent_copy() {
            let e = Entity::new("E", EntityKind::Elf, DVec2::new(1.0, 2.0));
            e.take_damage(70);
            let state = e.state();
            assert_eq!(state.health, 0);
            assert!(!state.alive);
            assert_eq!(state.position, DVec2::new(1.0, 2.0));
        }
    }

    proptest! {
        #[test]
        fn distance_is_symmetric(
            ax in 0.0f64..500.0, ay in 0.0f64..500.0,
            bx in 0.0f64..500.0, by in 0.0f64..500.0,
        ) {
            let a = Entity::new("a", EntityKind::Knight, DVec2::new(ax, ay));
            let b = Entity::new("b", EntityKind::Elf, DVec2::new(bx, by));
            prop_assert_eq!(a.distance_to(&b), b.distance_to(&a));
            prop_assert_eq!(a.distance_to(&a), 0.0);
        }

        #[test]
        fn moves_stay_inside_bounds(
            start_x in 0.0f64..100.0, start_y in 0.0f64..100.0,
            steps in proptest::collection::vec((-200.0f64..200.0, -200.0f64..200.0), 1..20),
        ) {
            let bounds = MapBounds::new(100.0, 100.0);
            let e = Entity::new("m", EntityKind::Knight, DVec2::new(start_x, start_y));
            for (dx, dy) in steps {
                e.move_by(DVec2::new(dx, dy), &bounds);
                prop_assert!(bounds.contains(e.position()));
            }
        }
    }
}
