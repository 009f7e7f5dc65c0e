//! Combat resolver: applies the combat rule to live entities.

use crate::entity::Entity;
use crate::feed::{KillEvent, KillFeed, Side};

use super::dice::{DiceSource, RandomDice};
use super::{is_contested, verdict, Verdict};

/// What a single [`CombatResolver::fight`] call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombatOutcome {
    /// Neither kind can kill the other. No dice were rolled.
    NoContest,
    /// Dice were rolled but nobody died, either because the capable side did
    /// not roll strictly higher or because the loser was already dead.
    Draw {
        /// The attacker's die.
        attack_roll: u8,
        /// The defender's die.
        defense_roll: u8,
    },
    /// One side died. The event has already been delivered to the feed.
    Kill(KillEvent),
}

impl CombatOutcome {
    /// Returns the kill event if this outcome is a kill.
    #[must_use]
    pub fn kill_event(&self) -> Option<&KillEvent> {
        match self {
            Self::Kill(event) => Some(event),
            _ => None,
        }
    }
}

/// Resolves combat tasks with dice from `D`.
///
/// The resolver holds no entity state; it is owned by whichever role resolves
/// combat and borrowed by the single-threaded editor.
///
/// # Example
///
/// ```
/// use glam::DVec2;
/// use skirmish_core::entity::{Entity, EntityKind};
/// use skirmish_core::feed::KillFeed;
/// use skirmish_core::resolver::{CombatResolver, ScriptedDice};
///
/// let knight = Entity::new("Knight1", EntityKind::Knight, DVec2::new(100.0, 100.0));
/// let elf = Entity::new("Elf1", EntityKind::Elf, DVec2::new(110.0, 110.0));
///
/// let mut resolver = CombatResolver::new(ScriptedDice::new([6, 1]));
/// let outcome = resolver.fight(&knight, &elf, &KillFeed::new());
///
/// assert!(outcome.kill_event().is_some());
/// assert!(knight.is_alive());
/// assert!(!elf.is_alive());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CombatResolver<D = RandomDice> {
    dice: D,
}

impl<D: DiceSource> CombatResolver<D> {
    /// Creates a resolver drawing rolls from `dice`.
    #[must_use]
    pub fn new(dice: D) -> Self {
        Self { dice }
    }

    /// The die source.
    #[must_use]
    pub fn dice(&self) -> &D {
        &self.dice
    }

    /// Resolves one engagement of `attacker` against `defender`.
    ///
    /// Uncontested pairings return immediately without touching the dice.
    /// Otherwise exactly two rolls are drawn, attack first, then defense. A
    /// kill is reported to `feed` only by the call that actually flipped the
    /// loser's alive flag, so a victim is never announced twice.
    pub fn fight(&mut self, attacker: &Entity, defender: &Entity, feed: &KillFeed) -> CombatOutcome {
        if !is_contested(attacker.kind(), defender.kind()) {
            return CombatOutcome::NoContest;
        }

        let attack_roll = self.dice.roll();
        let defense_roll = self.dice.roll();

        let (winner, killer, victim) =
            match verdict(attacker.kind(), defender.kind(), attack_roll, defense_roll) {
                Verdict::AttackerWins => (Side::Attacker, attacker, defender),
                Verdict::DefenderWins => (Side::Defender, defender, attacker),
                Verdict::Draw | Verdict::NoContest => {
                    return CombatOutcome::Draw {
                        attack_roll,
                        defense_roll,
                    };
                }
            };

        if !victim.kill() {
            tracing::trace!(victim = victim.name(), "loser already dead; no kill reported");
            return CombatOutcome::Draw {
                attack_roll,
                defense_roll,
            };
        }

        let event = KillEvent {
            killer: killer.descriptor(),
            victim: victim.descriptor(),
            winner,
            attack_roll,
            defense_roll,
        };
        tracing::debug!(
            killer = killer.name(),
            victim = victim.name(),
            attack_roll,
            defense_roll,
            "kill"
        );
        feed.notify(&event);
        CombatOutcome::Kill(event)
    }
}
