//! Single-threaded dungeon editor.
//!
//! The editor places entities by hand on a 500 x 500 map, saves and loads
//! them, and runs one battle round: an explicit `i < j` scan over living
//! pairs within a fixed range, resolved through the same [`CombatResolver`]
//! and [`KillFeed`] the concurrent simulation uses. No threads are involved.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use glam::DVec2;
use serde::Serialize;

use crate::entity::Entity;
use crate::error::{ConfigError, PersistenceError};
use crate::factory;
use crate::feed::{KillFeed, KillSink};
use crate::map::MapBounds;
use crate::persistence;
use crate::registry::EntityRegistry;
use crate::resolver::{CombatOutcome, CombatResolver, DiceSource};

/// Placement bounds of the editor map.
pub const EDITOR_BOUNDS: MapBounds = MapBounds::new(500.0, 500.0);

/// Result of one [`Editor::battle`] round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BattleSummary {
    /// Pairs that were within range and resolved.
    pub engagements: usize,
    /// Entities that died this round.
    pub kills: usize,
    /// Entities left after dead ones were removed.
    pub survivors: usize,
}

/// Hand-edited set of entities with its own kill feed.
///
/// # Example
///
/// ```
/// use skirmish_core::editor::Editor;
/// use skirmish_core::resolver::{CombatResolver, ScriptedDice};
///
/// let mut editor = Editor::new();
/// editor.add("Knight", "K1", 100.0, 100.0).unwrap();
/// editor.add("Elf", "E1", 110.0, 110.0).unwrap();
/// assert!(editor.add("Druid", "K1", 10.0, 10.0).is_err());
///
/// let summary = editor.battle(50.0, &mut CombatResolver::new(ScriptedDice::new([6, 1])));
/// assert_eq!(summary.kills, 1);
/// assert_eq!(editor.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct Editor {
    registry: EntityRegistry,
    feed: KillFeed,
}

impl Editor {
    /// Creates an empty editor with no sinks attached.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a kill sink for subsequent battles.
    pub fn attach_sink(&self, sink: Arc<dyn KillSink>) {
        self.feed.attach(sink);
    }

    /// Places a new entity.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::OutOfBounds`] if the coordinates leave `0..=500`
    /// - [`ConfigError::UnknownKind`] for an unrecognized kind tag
    /// - [`ConfigError::InvalidName`] for an empty name or one with whitespace
    /// - [`ConfigError::DuplicateName`] if the name is taken
    pub fn add(&mut self, kind: &str, name: &str, x: f64, y: f64) -> Result<Arc<Entity>, ConfigError> {
        Self::place(&self.registry, factory::create(kind, name, x, y)?)
    }

    fn place(registry: &EntityRegistry, entity: Entity) -> Result<Arc<Entity>, ConfigError> {
        let position = entity.position();
        if !EDITOR_BOUNDS.contains(position) {
            return Err(out_of_bounds(entity.name(), position));
        }
        registry.add(entity)
    }

    /// Writes every living entity to `path`. Returns the number written.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Io`] if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<usize, PersistenceError> {
        persistence::save(path, &self.registry.alive_records())
    }

    /// Replaces the current contents with the entities in `path`.
    ///
    /// The file is validated completely before anything is replaced; on
    /// error the editor is unchanged. Returns the number loaded.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Io`] if the file cannot be read, or
    /// [`PersistenceError::Record`] for the first line that does not parse,
    /// is out of bounds, or repeats a name.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<usize, PersistenceError> {
        let records = persistence::load_numbered(path)?;
        let fresh = EntityRegistry::new();
        for (line_no, record) in &records {
            Self::place(&fresh, factory::from_record(record)).map_err(|source| {
                PersistenceError::Record {
                    line_no: *line_no,
                    source,
                }
            })?;
        }
        let loaded = fresh.len();
        self.registry = fresh;
        tracing::debug!(loaded, "editor contents replaced");
        Ok(loaded)
    }

    /// Human-readable list of living entities.
    #[must_use]
    pub fn listing(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Total: {}", self.registry.len());
        for e in self.registry.capture().into_iter().filter(|e| e.alive) {
            let _ = writeln!(
                out,
                "- {} \"{}\" at ({}, {}) [HP: {}]",
                e.kind, e.name, e.position.x, e.position.y, e.health
            );
        }
        out
    }

    /// Runs one battle round among entities at most `range` apart.
    ///
    /// Pairs are visited once each in insertion order (`i < j`); a pair is
    /// skipped if either side already died earlier in the round. Dead
    /// entities are removed afterwards.
    pub fn battle<D: DiceSource>(&mut self, range: f64, resolver: &mut CombatResolver<D>) -> BattleSummary {
        let entities = self.registry.snapshot();
        let mut engagements = 0;
        let mut kills = 0;

        for (i, attacker) in entities.iter().enumerate() {
            for defender in &entities[i + 1..] {
                if !attacker.is_alive() || !defender.is_alive() {
                    continue;
                }
                if attacker.distance_to(defender) > range {
                    continue;
                }
                engagements += 1;
                if let CombatOutcome::Kill(_) = resolver.fight(attacker, defender, &self.feed) {
                    kills += 1;
                }
            }
        }

        let removed = self.registry.remove_dead();
        let summary = BattleSummary {
            engagements,
            kills,
            survivors: self.registry.len(),
        };
        tracing::info!(range, removed, ?summary, "battle round finished");
        summary
    }

    /// Looks up an entity by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Entity>> {
        self.registry.get(name)
    }

    /// Number of entities held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Returns `true` if the editor holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

fn out_of_bounds(name: &str, position: DVec2) -> ConfigError {
    ConfigError::OutOfBounds {
        name: name.to_string(),
        x: position.x,
        y: position.y,
        width: EDITOR_BOUNDS.width,
        height: EDITOR_BOUNDS.height,
    }
}
