//! Simulation configuration, loading and validation.
//!
//! [`SimulationConfig`] is the input for [`Simulation::new`](crate::simulation::Simulation::new).
//! Every field has a default, so a partial JSON document (or `{}`) is valid.
//! [`validate()`](SimulationConfig::validate) checks ranges at startup.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::map::MapBounds;

/// Largest accepted map width or height.
pub const MAX_MAP_EXTENT: f64 = 1.0e6;

/// Tunables for one concurrent run.
///
/// # Example
///
/// ```
/// use skirmish_core::config::SimulationConfig;
///
/// let config = SimulationConfig::from_json_str(r#"{ "duration_ms": 500, "seed": 7 }"#).unwrap();
/// assert_eq!(config.duration_ms, 500);
/// assert_eq!(config.initial_entities, 50);
/// assert_eq!(config.seed, Some(7));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Map extent. Default: 100 x 100.
    pub map: MapBounds,
    /// Entities created by [`populate_random`](crate::simulation::Simulation::populate_random). Default: 50.
    pub initial_entities: usize,
    /// Wall-clock length of a run. Default: 30 000 ms.
    pub duration_ms: u64,
    /// Period of the movement/detection role. Default: 100 ms.
    pub tick_interval_ms: u64,
    /// Period of the reporting role. Default: 1 000 ms.
    pub report_interval_ms: u64,
    /// RNG seed for placement, movement and dice. `None` = OS entropy.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            map: MapBounds::default(),
            initial_entities: 50,
            duration_ms: 30_000,
            tick_interval_ms: 100,
            report_interval_ms: 1_000,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Parses a JSON document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] on malformed input. The result is not
    /// validated; call [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] or [`ConfigError::Json`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks that every setting is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSetting`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, extent) in [("map.width", self.map.width), ("map.height", self.map.height)] {
            if !(extent.is_finite() && extent > 0.0) {
                return Err(ConfigError::InvalidSetting {
                    field,
                    reason: "must be finite and greater than zero",
                });
            }
            if extent > MAX_MAP_EXTENT {
                return Err(ConfigError::InvalidSetting {
                    field,
                    reason: "must not exceed 1e6",
                });
            }
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "tick_interval_ms",
                reason: "must be at least 1",
            });
        }
        if self.report_interval_ms == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "report_interval_ms",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    /// Run length as a [`Duration`].
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Detector period as a [`Duration`].
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Reporter period as a [`Duration`].
    #[must_use]
    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_run() {
        let config = SimulationConfig::default();
        assert_eq!(config.map, MapBounds::new(100.0, 100.0));
        assert_eq!(config.initial_entities, 50);
        assert_eq!(config.duration(), Duration::from_secs(30));
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
        assert_eq!(config.report_interval(), Duration::from_secs(1));
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_document_is_default() {
        let config = SimulationConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn nested_map_override() {
        let config =
            SimulationConfig::from_json_str(r#"{ "map": { "width": 40.0, "height": 20.0 } }"#)
                .unwrap();
        assert_eq!(config.map, MapBounds::new(40.0, 20.0));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = SimulationConfig::from_json_str("{ duration_ms: }").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = SimulationConfig::default();
        config.map.width = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSetting { field: "map.width", .. })
        ));

        let mut config = SimulationConfig::default();
        config.map.height = f64::NAN;
        assert!(config.validate().is_err());

        let config = SimulationConfig {
            tick_interval_ms: 0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSetting { field: "tick_interval_ms", .. })
        ));

        let config = SimulationConfig {
            report_interval_ms: 0,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_huge_maps() {
        for extent in [f64::MAX, MAX_MAP_EXTENT * 2.0] {
            let mut config = SimulationConfig::default();
            config.map.width = extent;
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidSetting { field: "map.width", .. })
            ));

            let mut config = SimulationConfig::default();
            config.map.height = extent;
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidSetting { field: "map.height", .. })
            ));
        }

        let mut config = SimulationConfig::default();
        config.map = MapBounds::new(MAX_MAP_EXTENT, MAX_MAP_EXTENT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "initial_entities": 12, "tick_interval_ms": 20 }}"#).unwrap();
        let config = SimulationConfig::load(file.path()).unwrap();
        assert_eq!(config.initial_entities, 12);
        assert_eq!(config.tick_interval_ms, 20);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SimulationConfig::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
