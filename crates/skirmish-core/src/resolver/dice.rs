//! Six-sided die sources.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Value returned by [`ScriptedDice`] once its sequence is exhausted.
pub const NEUTRAL_ROLL: u8 = 3;

/// Produces die rolls in `1..=6`.
///
/// A source is owned by exactly one combat role, so it only needs `Send`.
pub trait DiceSource: Send {
    /// Rolls one die.
    fn roll(&mut self) -> u8;
}

impl<D: DiceSource + ?Sized> DiceSource for &mut D {
    fn roll(&mut self) -> u8 {
        (**self).roll()
    }
}

impl<D: DiceSource + ?Sized> DiceSource for Box<D> {
    fn roll(&mut self) -> u8 {
        (**self).roll()
    }
}

/// Uniform die backed by a `ChaCha8Rng`.
#[derive(Debug, Clone)]
pub struct RandomDice {
    rng: ChaCha8Rng,
}

impl RandomDice {
    /// Seeds from operating-system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Seeds deterministically.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomDice {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl DiceSource for RandomDice {
    fn roll(&mut self) -> u8 {
        self.rng.gen_range(1..=6)
    }
}

/// Replays a fixed sequence of rolls, then returns [`NEUTRAL_ROLL`] forever.
///
/// # Example
///
/// ```
/// use skirmish_core::resolver::{DiceSource, ScriptedDice};
///
/// let mut dice = ScriptedDice::new([6, 1]);
/// assert_eq!(dice.roll(), 6);
/// assert_eq!(dice.roll(), 1);
/// assert_eq!(dice.roll(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    rolls: VecDeque<u8>,
}

impl ScriptedDice {
    /// Creates a source that yields `rolls` in order.
    #[must_use]
    pub fn new(rolls: impl IntoIterator<Item = u8>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
        }
    }

    /// Rolls not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }
}

impl DiceSource for ScriptedDice {
    fn roll(&mut self) -> u8 {
        self.rolls.pop_front().unwrap_or(NEUTRAL_ROLL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_dice_stay_on_the_die() {
        let mut dice = RandomDice::seeded(11);
        let mut seen = [false; 7];
        for _ in 0..600 {
            let r = dice.roll();
            assert!((1..=6).contains(&r));
            seen[usize::from(r)] = true;
        }
        assert!(seen[1..].iter().all(|&s| s), "every face should appear");
    }

    #[test]
    fn seeded_dice_repeat() {
        let mut a = RandomDice::seeded(5);
        let mut b = RandomDice::seeded(5);
        for _ in 0..20 {
            assert_eq!(a.roll(), b.roll());
        }
    }

    #[test]
    fn scripted_dice_fall_back_to_neutral() {
        let mut dice = ScriptedDice::new([1, 6]);
        assert_eq!(dice.remaining(), 2);
        assert_eq!(dice.roll(), 1);
        assert_eq!(dice.roll(), 6);
        assert_eq!(dice.remaining(), 0);
        assert_eq!(dice.roll(), NEUTRAL_ROLL);
        assert_eq!(dice.roll(), NEUTRAL_ROLL);
    }

    #[test]
    fn boxed_and_borrowed_sources() {
        let mut boxed: Box<dyn DiceSource> = Box::new(ScriptedDice::new([4]));
        assert_eq!(boxed.roll(), 4);

        fn roll_twice<D: DiceSource>(mut dice: D) -> (u8, u8) {
            (dice.roll(), dice.roll())
        }
        let mut scripted = ScriptedDice::new([2, 5, 1]);
        assert_eq!(roll_twice(&mut scripted), (2, 5));
        assert_eq!(scripted.remaining(), 1);
    }
}
