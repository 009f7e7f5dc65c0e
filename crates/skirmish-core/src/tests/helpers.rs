//! Test helpers for building short runs and observing their output.

use std::collections::HashSet;
use std::sync::Arc;

use glam::DVec2;
use parking_lot::Mutex;

use crate::config::SimulationConfig;
use crate::entity::EntityKind;
use crate::error::SinkError;
use crate::feed::KillEvent;
use crate::render::{Frame, FrameSink};
use crate::simulation::Simulation;

// =============================================================================
// Configuration
// =============================================================================

/// A seeded configuration with millisecond-scale intervals.
pub fn quick_config(entities: usize, duration_ms: u64) -> SimulationConfig {
    SimulationConfig {
        initial_entities: entities,
        duration_ms,
        tick_interval_ms: 2,
        report_interval_ms: 10,
        seed: Some(0x5EED),
        ..SimulationConfig::default()
    }
}

/// Spawns `count` entities of `kind` named `<prefix><n>` around `center`.
pub fn spawn_cluster(sim: &Simulation, kind: EntityKind, prefix: &str, count: usize, center: DVec2) {
    for n in 0..count {
        let offset = DVec2::new(n as f64 * 0.5, 0.0);
        sim.spawn(kind, &format!("{prefix}{n}"), center + offset)
            .unwrap();
    }
}

// =============================================================================
// Observation
// =============================================================================

/// Asserts that no victim appears in two events and returns the victim names.
pub fn unique_victims(events: &[KillEvent]) -> HashSet<String> {
    let mut victims = HashSet::new();
    for event in events {
        assert!(
            victims.insert(event.victim.name.clone()),
            "{} was reported killed twice",
            event.victim.name
        );
    }
    victims
}

/// Frame sink that keeps every frame for inspection.
#[derive(Clone, Default)]
pub struct CapturingRenderer {
    frames: Arc<Mutex<Vec<Frame>>>,
}

impl CapturingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().clone()
    }
}

impl FrameSink for CapturingRenderer {
    fn present(&mut self, frame: &Frame) -> Result<(), SinkError> {
        self.frames.lock().push(frame.clone());
        Ok(())
    }
}

/// Frame sink whose every write fails.
pub struct BrokenRenderer;

impl FrameSink for BrokenRenderer {
    fn present(&mut self, _frame: &Frame) -> Result<(), SinkError> {
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "terminal gone").into())
    }
}
