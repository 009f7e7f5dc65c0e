//! Combat resolution: the kill-capability matrix and the dice protocol.
//!
//! Resolution is split in two layers:
//! - [`can_kill`] and [`verdict`] are pure functions of kinds and rolls. They
//!   hold the whole combat rule and are tested exhaustively.
//! - [`CombatResolver`] applies a verdict to live entities: it draws the two
//!   dice from a [`DiceSource`], marks the loser dead and hands the resulting
//!   [`KillEvent`](crate::feed::KillEvent) to the kill feed.
//!
//! # Kill matrix
//!
//! | attacker \ defender | Knight | Druid | Elf |
//! |---|---|---|---|
//! | Knight | no  | no  | yes |
//! | Druid  | no  | yes | no  |
//! | Elf    | yes | yes | no  |
//!
//! Capability is necessary, not sufficient: the capable side must also roll
//! strictly higher. The table is not a transitive ordering and nothing here
//! assumes one.

mod combat;
mod dice;

pub use combat::{CombatOutcome, CombatResolver};
pub use dice::{DiceSource, RandomDice, ScriptedDice, NEUTRAL_ROLL};

use crate::entity::EntityKind;

/// `KILL_MATRIX[attacker][defender]`, indexed by [`EntityKind::index`].
pub const KILL_MATRIX: [[bool; 3]; 3] = [
    // Knight
    [false, false, true],
    // Druid
    [false, true, false],
    // Elf
    [true, true, false],
];

/// Returns `true` if `attacker` may kill `defender` given a winning roll.
///
/// ```
/// use skirmish_core::entity::EntityKind::{Druid, Elf, Knight};
/// use skirmish_core::resolver::can_kill;
///
/// assert!(can_kill(Knight, Elf));
/// assert!(can_kill(Elf, Knight));
/// assert!(!can_kill(Knight, Knight));
/// ```
#[must_use]
pub const fn can_kill(attacker: EntityKind, defender: EntityKind) -> bool {
    KILL_MATRIX[attacker.index()][defender.index()]
}

/// Returns `true` if either side of the pairing could kill the other.
///
/// When this is `false` no dice are rolled.
#[must_use]
pub const fn is_contested(attacker: EntityKind, defender: EntityKind) -> bool {
    can_kill(attacker, defender) || can_kill(defender, attacker)
}

/// Result of the combat rule for one pairing and one pair of rolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Neither kind can kill the other. Rolls are irrelevant.
    NoContest,
    /// A capable side did not roll strictly higher. Both survive.
    Draw,
    /// The attacker kills the defender.
    AttackerWins,
    /// The defender kills the attacker.
    DefenderWins,
}

/// Applies the combat rule.
///
/// - both capable: the higher roll wins, a tie is a draw
/// - one capable: that side wins iff its roll is strictly higher
/// - neither capable: no contest
///
/// ```
/// use skirmish_core::entity::EntityKind::{Elf, Knight};
/// use skirmish_core::resolver::{verdict, Verdict};
///
/// assert_eq!(verdict(Knight, Elf, 6, 1), Verdict::AttackerWins);
/// assert_eq!(verdict(Knight, Elf, 1, 6), Verdict::DefenderWins);
/// assert_eq!(verdict(Knight, Elf, 4, 4), Verdict::Draw);
/// ```
#[must_use]
pub fn verdict(
    attacker: EntityKind,
    defender: EntityKind,
    attack_roll: u8,
    defense_roll: u8,
) -> Verdict {
    let attacker_can = can_kill(attacker, defender);
    let defender_can = can_kill(defender, attacker);

    if !attacker_can && !defender_can {
        return Verdict::NoContest;
    }
    if attacker_can && attack_roll > defense_roll {
        Verdict::AttackerWins
    } else if defender_can && defense_roll > attack_roll {
        Verdict::DefenderWins
    } else {
        Verdict::Draw
    }
}
