//! Map bounds shared by movement, placement checks and rendering.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned play area anchored at the origin.
///
/// Every position produced by movement lies in `[0, width] x [0, height]`.
///
/// # Example
///
/// ```
/// use skirmish_core::map::MapBounds;
/// use glam::DVec2;
///
/// let bounds = MapBounds::new(100.0, 100.0);
/// assert_eq!(bounds.clamp(DVec2::new(-5.0, 140.0)), DVec2::new(0.0, 100.0));
/// assert!(bounds.contains(DVec2::new(100.0, 0.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    /// Extent along x.
    pub width: f64,
    /// Extent along y.
    pub height: f64,
}

impl MapBounds {
    /// Creates bounds of the given size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Returns the upper corner of the map.
    #[must_use]
    pub fn max(&self) -> DVec2 {
        DVec2::new(self.width, self.height)
    }

    /// Clamps a point into the map, inclusive on both edges.
    #[must_use]
    pub fn clamp(&self, point: DVec2) -> DVec2 {
        point.clamp(DVec2::ZERO, self.max())
    }

    /// Returns `true` if the point lies inside the map (edges included).
    #[must_use]
    pub fn contains(&self, point: DVec2) -> bool {
        point.x >= 0.0 && point.x <= self.width && point.y >= 0.0 && point.y <= self.height
    }
}

impl Default for MapBounds {
    fn default() -> Self {
        Self::new(100.0, 100.0)
    }
}
