//! # Skirmish Core
//!
//! Concurrent combat simulation on a bounded 2-D map.
//!
//! Entities of three kinds wander the map; whenever two of them come within
//! engagement range a combat task is queued, and a dedicated role resolves it
//! with a kill-capability matrix and two six-sided dice.
//!
//! ## Architecture
//!
//! - **Entities**: [`entity::Entity`], each guarding its own mutable state
//! - **Registry**: [`registry::EntityRegistry`], shared ownership and membership
//! - **Queue**: [`queue::TaskQueue`], blocking FIFO with idempotent close
//! - **Resolver**: [`resolver`], the pure combat rule plus dice
//! - **Feed**: [`feed::KillFeed`], multicast of kill events to sinks
//! - **Coordinator**: [`simulation::Simulation`], detector, combat and reporter
//!   roles under structured thread scopes
//!
//! Around the core sit the collaborators: [`factory`], [`persistence`],
//! [`render`], [`config`] and the single-threaded [`editor`].
//!
//! ## Usage
//!
//! ```
//! use skirmish_core::{Simulation, SimulationConfig};
//!
//! let config = SimulationConfig {
//!     initial_entities: 30,
//!     duration_ms: 30,
//!     tick_interval_ms: 5,
//!     seed: Some(9),
//!     ..SimulationConfig::default()
//! };
//! let mut sim = Simulation::new(config)?;
//! sim.populate_random()?;
//! let report = sim.run()?;
//! println!("{report}");
//! # Ok::<(), skirmish_core::error::SimulationError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod editor;
pub mod entity;
pub mod error;
pub mod factory;
pub mod feed;
pub mod map;
pub mod movement;
pub mod persistence;
pub mod queue;
pub mod registry;
pub mod render;
pub mod resolver;
pub mod simulation;

#[cfg(test)]
mod tests;

pub use config::SimulationConfig;
pub use editor::{BattleSummary, Editor};
pub use entity::{Entity, EntityKind};
pub use feed::{KillEvent, KillFeed, KillSink};
pub use map::MapBounds;
pub use simulation::{Phase, Simulation, SimulationReport, StopHandle};
