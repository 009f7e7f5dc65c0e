//! Movement and engagement detection for one detector tick.
//!
//! A tick first moves every living entity, then scans all living pairs, so
//! the scan always sees post-move positions.

use std::f64::consts::TAU;
use std::sync::Arc;

use glam::DVec2;
use rand::Rng;

use crate::entity::Entity;
use crate::map::MapBounds;
use crate::queue::{CombatTask, TaskQueue};

/// Distance at which two entities engage: the larger of their kill ranges.
#[must_use]
pub fn engagement_range(a: &Entity, b: &Entity) -> f64 {
    f64::from(a.stats().kill_range.max(b.stats().kill_range))
}

/// Returns `true` if `a` and `b` are both alive and within engagement range.
#[must_use]
pub fn is_engaged(a: &Entity, b: &Entity) -> bool {
    a.is_alive() && b.is_alive() && a.distance_to(b) <= engagement_range(a, b)
}

/// Moves every living entity one step in a uniformly random direction.
///
/// The step length is the entity's move range; the result is clamped into
/// `bounds`. Returns how many entities moved.
pub fn step_entities<R: Rng + ?Sized>(
    entities: &[Arc<Entity>],
    bounds: &MapBounds,
    rng: &mut R,
) -> usize {
    let mut moved = 0;
    for entity in entities.iter().filter(|e| e.is_alive()) {
        let heading = rng.gen_range(0.0..TAU);
        let step = DVec2::from_angle(heading) * f64::from(entity.stats().move_range);
        entity.move_by(step, bounds);
        moved += 1;
    }
    moved
}

/// Scans every living pair `(i, j)` with `i < j` and enqueues a combat task
/// for each engaged pair, with the earlier entity as attacker.
///
/// Returns the number of tasks accepted by the queue.
pub fn scan_engagements(entities: &[Arc<Entity>], queue: &TaskQueue) -> usize {
    let mut enqueued = 0;
    for (i, attacker) in entities.iter().enumerate() {
        if !attacker.is_alive() {
            continue;
        }
        for defender in &entities[i + 1..] {
            if is_engaged(attacker, defender) && queue.push(CombatTask::new(attacker, defender)) {
                enqueued += 1;
            }
        }
    }
    enqueued
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn at(name: &str, kind: EntityKind, x: f64, y: f64) -> Arc<Entity> {
        Arc::new(Entity::new(name, kind, DVec2::new(x, y)))
    }

    mod step_tests {
        use super::*;

        #[test]
        fn steps_by_move_range() {
            let bounds = MapBounds::new(1000.0, 1000.0);
            let knight = at("K", EntityKind::Knight, 500.0, 500.0);
            let elf = at("E", EntityKind::Elf, 500.0, 500.0);
            let mut rng = ChaCha8Rng::seed_from_u64(1);

            let moved = step_entities(&[knight.clone(), elf.clone()], &bounds, &mut rng);

            assert_eq!(moved, 2);
            let center = DVec2::new(500.0, 500.0);
            assert!((knight.position().distance(center) - 30.0).abs() < 1e-9);
            assert!((elf.position().distance(center) - 10.0).abs() < 1e-9);
        }

        #[test]
        fn dead_entities_stay_put() {
            let bounds = MapBounds::default();
            let dead = at("D", EntityKind::Druid, 50.0, 50.0);
            dead.kill();
            let moved = step_entities(
                std::slice::from_ref(&dead),
                &bounds,
                &mut ChaCha8Rng::seed_from_u64(2),
            );
            assert_eq!(moved, 0);
            assert_eq!(dead.position(), DVec2::new(50.0, 50.0));
        }
    }

    mod scan_tests {
        use super::*;

        #[test]
        fn elf_range_covers_knight() {
            // 40 apart: outside the Knight's 10, inside the Elf's 50.
            let knight = at("K", EntityKind::Knight, 0.0, 0.0);
            let elf = at("E", EntityKind::Elf, 40.0, 0.0);
            assert!(is_engaged(&knight, &elf));
            assert!(is_engaged(&elf, &knight));
        }

        #[test]
        fn knights_out_of_range() {
            let a = at("A", EntityKind::Knight, 0.0, 0.0);
            let b = at("B", EntityKind::Knight, 10.5, 0.0);
            assert!(!is_engaged(&a, &b));
        }

        #[test]
        fn range_edge_is_inclusive() {
            let a = at("A", EntityKind::Druid, 0.0, 0.0);
            let b = at("B", EntityKind::Druid, 6.0, 8.0);
            assert!(is_engaged(&a, &b));
        }

        #[test]
        fn scan_enqueues_each_pair_once_in_order() {
            let entities = vec![
                at("A", EntityKind::Druid, 0.0, 0.0),
                at("B", EntityKind::Druid, 5.0, 0.0),
                at("C", EntityKind::Druid, 90.0, 90.0),
                at("D", EntityKind::Elf, 30.0, 0.0),
            ];
            let queue = TaskQueue::new();

            // A-B (5 <= 10), A-D (30 <= 50), B-D (25 <= 50).
            assert_eq!(scan_engagements(&entities, &queue), 3);

            let names: Vec<_> = std::iter::from_fn(|| queue.try_pop())
                .map(|t| {
                    (
                        t.attacker().unwrap().name().to_string(),
                        t.defender().unwrap().name().to_string(),
                    )
                })
                .collect();
            assert_eq!(
                names,
                vec![
                    ("A".to_string(), "B".to_string()),
                    ("A".to_string(), "D".to_string()),
                    ("B".to_string(), "D".to_string()),
                ]
            );
        }

        #[test]
        fn scan_skips_dead_entities() {
            let entities = vec![
                at("A", EntityKind::Elf, 0.0, 0.0),
                at("B", EntityKind::Elf, 1.0, 0.0),
            ];
            entities[1].kill();
            let queue = TaskQueue::new();
            assert_eq!(scan_engagements(&entities, &queue), 0);
        }

        #[test]
        fn scan_after_stop_enqueues_nothing() {
            let entities = vec![
                at("A", EntityKind::Elf, 0.0, 0.0),
                at("B", EntityKind::Elf, 1.0, 0.0),
            ];
            let queue = TaskQueue::new();
            queue.stop();
            assert_eq!(scan_engagements(&entities, &queue), 0);
        }
    }

    proptest! {
        #[test]
        fn movement_stays_in_bounds(
            x in 0.0f64..=100.0,
            y in 0.0f64..=100.0,
            seed in any::<u64>(),
            steps in 1usize..50,
        ) {
            let bounds = MapBounds::default();
            let entities: Vec<_> = EntityKind::ALL
                .iter()
                .map(|&kind| at(kind.as_str(), kind, x, y))
                .collect();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            for _ in 0..steps {
                step_entities(&entities, &bounds, &mut rng);
            }
            for e in &entities {
                prop_assert!(bounds.contains(e.position()), "{:?}", e);
            }
        }
    }
}
