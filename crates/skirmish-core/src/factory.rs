//! Entity construction from tags, text records and random rolls.

use glam::DVec2;
use rand::Rng;

use crate::entity::{validate_name, Entity, EntityKind};
use crate::error::ConfigError;
use crate::map::MapBounds;
use crate::persistence::EntityRecord;

/// Builds an entity from a kind tag such as `"Knight"`.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownKind`] if the tag is not recognized, or
/// [`ConfigError::InvalidName`] if `name` is empty or contains whitespace.
///
/// # Example
///
/// ```
/// use skirmish_core::factory;
///
/// let knight = factory::create("Knight", "TestKnight", 100.0, 100.0).unwrap();
/// assert_eq!(knight.name(), "TestKnight");
/// assert!(factory::create("InvalidType", "Test", 0.0, 0.0).is_err());
/// ```
pub fn create(kind: &str, name: &str, x: f64, y: f64) -> Result<Entity, ConfigError> {
    let kind = kind.parse::<EntityKind>()?;
    validate_name(name)?;
    Ok(Entity::new(name, kind, DVec2::new(x, y)))
}

/// Builds an entity from a parsed record.
#[must_use]
pub fn from_record(record: &EntityRecord) -> Entity {
    Entity::new(
        record.name.as_str(),
        record.kind,
        DVec2::new(record.x, record.y),
    )
}

/// Builds an entity from a text line in record form (`Knight Arthur 150 250`).
///
/// # Errors
///
/// Returns [`ConfigError::MalformedRecord`] or [`ConfigError::UnknownKind`].
pub fn from_record_line(line: &str) -> Result<Entity, ConfigError> {
    let record: EntityRecord = line.parse()?;
    Ok(from_record(&record))
}

/// Rolls `count` entities with uniform kinds and uniform positions in `bounds`.
///
/// Names are `<Kind>_<n>` with `n` counting from 1, so they are unique
/// within one batch.
pub fn random_entities<R: Rng + ?Sized>(
    count: usize,
    bounds: &MapBounds,
    rng: &mut R,
) -> Vec<Entity> {
    (1..=count)
        .map(|n| {
            let kind = EntityKind::ALL[rng.gen_range(0..EntityKind::ALL.len())];
            let position = DVec2::new(
                rng.gen_range(0.0..=bounds.width),
                rng.gen_range(0.0..=bounds.height),
            );
            Entity::new(format!("{kind}_{n}"), kind, position)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    #[test]
    fn create_each_kind() {
        for (tag, x) in [("Knight", 100.0), ("Druid", 200.0), ("Elf", 300.0)] {
            let e = create(tag, "Test", x, x).unwrap();
            assert_eq!(e.kind().to_string(), tag);
            assert_eq!(e.name(), "Test");
            assert_eq!(e.position(), DVec2::new(x, x));
            assert!(e.is_alive());
        }
    }

    #[test]
    fn create_invalid_kind() {
        let err = create("InvalidType", "Test", 100.0, 100.0).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKind(_)));
    }

    #[test]
    fn create_rejects_names_that_break_records() {
        for name in ["", "Sir Arthur"] {
            let err = create("Knight", name, 1.0, 2.0).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidName { .. }), "{name:?}");
        }
    }

    #[test]
    fn create_from_record_line() {
        let e = from_record_line("Knight Arthur 150 250").unwrap();
        assert_eq!(e.kind(), EntityKind::Knight);
        assert_eq!(e.name(), "Arthur");
        assert_eq!(e.position(), DVec2::new(150.0, 250.0));
    }

    #[test]
    fn create_from_invalid_line() {
        assert!(from_record_line("InvalidLine").is_err());
    }

    #[test]
    fn record_round_trip_keeps_identity() {
        let original = create("Druid", "Merlin", 200.0, 300.0).unwrap();
        let rebuilt = from_record_line(&original.record().to_string()).unwrap();
        assert_eq!(rebuilt.kind(), original.kind());
        assert_eq!(rebuilt.name(), original.name());
        assert_eq!(rebuilt.position(), original.position());
    }

    #[test]
    fn random_entities_are_in_bounds_and_unique() {
        let bounds = MapBounds::new(100.0, 60.0);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let entities = random_entities(200, &bounds, &mut rng);

        assert_eq!(entities.len(), 200);
        let names: HashSet<_> = entities.iter().map(|e| e.name().to_string()).collect();
        assert_eq!(names.len(), 200);
        for e in &entities {
            assert!(bounds.contains(e.position()), "{e:?} out of bounds");
            assert!(e.name().starts_with(e.kind().as_str()));
        }
    }

    #[test]
    fn random_entities_same_seed_same_layout() {
        let bounds = MapBounds::default();
        let a = random_entities(10, &bounds, &mut ChaCha8Rng::seed_from_u64(3));
        let b = random_entities(10, &bounds, &mut ChaCha8Rng::seed_from_u64(3));
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.name(), y.name());
            assert_eq!(x.position(), y.position());
        }
    }
}
