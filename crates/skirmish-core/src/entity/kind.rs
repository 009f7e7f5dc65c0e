//! Entity kinds and their fixed per-kind constants.
//!
//! The kind is a closed tagged variant. Combat dispatch indexes a static table
//! with it (see [`crate::resolver`]), so there is no per-kind behaviour here,
//! only data.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Fixed constants carried by every entity of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindStats {
    /// Health an entity starts with.
    pub base_health: i32,
    /// Damage dealt by the health-accounting path.
    pub damage: i32,
    /// Length of one random movement step.
    pub move_range: u32,
    /// Distance at which the entity engages another.
    pub kill_range: u32,
}

/// The closed set of entity kinds.
///
/// # Variants
///
/// - `Knight`: tough and fast, short reach
/// - `Druid`: slow, short reach
/// - `Elf`: fragile and slow, long reach
///
/// # Example
///
/// ```
/// use skirmish_core::entity::EntityKind;
///
/// let kind: EntityKind = "Elf".parse().unwrap();
/// assert_eq!(kind, EntityKind::Elf);
/// assert_eq!(kind.stats().kill_range, 50);
/// assert_eq!(kind.to_string(), "Elf");
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// Heavy melee unit.
    Knight,
    /// Nature caster.
    Druid,
    /// Long-range archer.
    Elf,
}

impl EntityKind {
    /// Every kind, in table order.
    pub const ALL: [Self; 3] = [Self::Knight, Self::Druid, Self::Elf];

    /// Row/column index into per-kind tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Knight => 0,
            Self::Druid => 1,
            Self::Elf => 2,
        }
    }

    /// Returns the fixed constants for this kind.
    #[must_use]
    pub const fn stats(self) -> KindStats {
        match self {
            Self::Knight => KindStats {
                base_health: 100,
                damage: 30,
                move_range: 30,
                kill_range: 10,
            },
            Self::Druid => KindStats {
                base_health: 80,
                damage: 25,
                move_range: 10,
                kill_range: 10,
            },
            Self::Elf => KindStats {
                base_health: 70,
                damage: 35,
                move_range: 10,
                kill_range: 50,
            },
        }
    }

    /// Single-character map symbol.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Knight => 'K',
            Self::Druid => 'D',
            Self::Elf => 'E',
        }
    }

    /// Canonical name, identical to the `Display` output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Knight => "Knight",
            Self::Druid => "Druid",
            Self::Elf => "Elf",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownKind(s.to_string()))
    }
}
