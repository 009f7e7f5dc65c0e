//! Simulation coordinator: three concurrent roles over one shared registry.
//!
//! A [`Simulation`] moves through four phases:
//!
//! 1. **Initialized**: entities are added, no thread runs yet
//! 2. **Running**: the detector, combat and reporter roles are active
//! 3. **Stopping**: the run duration elapsed or a [`StopHandle`] fired; the
//!    running flag is cleared and the task queue is closed
//! 4. **Stopped**: every role has been joined and the final report is built
//!
//! # Roles
//!
//! - **detector**: every tick, moves each living entity, then scans all living
//!   pairs and enqueues a [`CombatTask`](crate::queue::CombatTask) per engaged pair
//! - **combat**: pops tasks, drops stale ones, resolves the rest and feeds
//!   kills to the [`KillFeed`]. It is the only role that rolls dice
//! - **reporter**: every interval, captures a [`Frame`] and hands it to the
//!   configured [`FrameSink`], if any
//!
//! Roles are scoped threads. `run()` returns only after all three joined.
//!
//! # Shutdown
//!
//! The detector is joined before the queue is closed, so every task it
//! enqueued is still delivered; the combat role then drains the queue and
//! exits on closure. Interval sleeps wait on a shutdown channel and end as
//! soon as the run stops. Hence `enqueued == resolved + stale` in every report.
//!
//! # Example
//!
//! ```
//! use skirmish_core::config::SimulationConfig;
//! use skirmish_core::simulation::{Phase, Simulation};
//!
//! let config = SimulationConfig {
//!     initial_entities: 20,
//!     duration_ms: 50,
//!     tick_interval_ms: 5,
//!     report_interval_ms: 20,
//!     seed: Some(42),
//!     ..SimulationConfig::default()
//! };
//!
//! let mut sim = Simulation::new(config).unwrap();
//! sim.populate_random().unwrap();
//! let report = sim.run().unwrap();
//!
//! assert_eq!(sim.phase(), Phase::Stopped);
//! assert_eq!(report.total, 20);
//! assert_eq!(report.stats.enqueued, report.stats.resolved + report.stats.stale);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use glam::DVec2;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::config::SimulationConfig;
use crate::entity::{Entity, EntityKind, EntitySnapshot};
use crate::error::{ConfigError, SimulationError};
use crate::factory;
use crate::feed::{KillFeed, KillSink};
use crate::map::MapBounds;
use crate::movement::{scan_engagements, step_entities};
use crate::queue::TaskQueue;
use crate::registry::EntityRegistry;
use crate::render::{Frame, FrameSink};
use crate::resolver::{CombatOutcome, CombatResolver, DiceSource, RandomDice};

// =============================================================================
// Phase and stop handle
// =============================================================================

/// Lifecycle phase of a [`Simulation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    /// Entities may be added; no role runs.
    Initialized,
    /// Roles are active.
    Running,
    /// Shutdown was triggered; roles are finishing.
    Stopping,
    /// Terminal. All roles have exited.
    Stopped,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initialized => "initialized",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
struct Shared {
    phase: Mutex<Phase>,
    running: AtomicBool,
}

impl Shared {
    fn set_phase(&self, phase: Phase) {
        let previous = std::mem::replace(&mut *self.phase.lock(), phase);
        tracing::debug!(from = %previous, to = %phase, "phase transition");
    }
}

/// Ends a run early from any thread.
///
/// Cloneable and cheap. A stop requested before [`Simulation::run`] starts
/// ends that run as soon as it begins.
#[derive(Debug, Clone)]
pub struct StopHandle {
    signal: Sender<()>,
    shared: Arc<Shared>,
}

impl StopHandle {
    /// Requests shutdown. Idempotent.
    pub fn stop(&self) {
        // A full channel already carries a pending stop.
        let _ = self.signal.try_send(());
    }

    /// Current phase of the simulation this handle belongs to.
    #[must_use]
    pub fn phase(&self) -> Phase {
        *self.shared.phase.lock()
    }
}

// =============================================================================
// Statistics and report
// =============================================================================

#[derive(Debug, Default)]
struct Counters {
    ticks: AtomicU64,
    enqueued: AtomicU64,
    resolved: AtomicU64,
    stale: AtomicU64,
    kills: AtomicU64,
    frames: AtomicU64,
}

impl Counters {
    fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    fn snapshot(&self) -> RunStats {
        RunStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            resolved: self.resolved.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            kills: self.kills.load(Ordering::Relaxed),
            frames: self.frames.load(Ordering::Relaxed),
        }
    }
}

/// Counters collected over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Detector ticks completed.
    pub ticks: u64,
    /// Combat tasks accepted by the queue.
    pub enqueued: u64,
    /// Tasks resolved with both participants alive.
    pub resolved: u64,
    /// Tasks discarded because a participant had died.
    pub stale: u64,
    /// Kills delivered to the feed.
    pub kills: u64,
    /// Frames captured by the reporter.
    pub frames: u64,
}

/// Final state of a run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// Living entities at the end, in registry order.
    pub survivors: Vec<EntitySnapshot>,
    /// Entities registered at the end, dead ones included.
    pub total: usize,
    /// Role counters.
    pub stats: RunStats,
    /// Wall-clock time from start to the last join.
    pub elapsed: Duration,
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Survivors: {} of {}", self.survivors.len(), self.total)?;
        if self.survivors.is_empty() {
            writeln!(f, "  Nobody survived!")?;
        }
        for e in &self.survivors {
            writeln!(
                f,
                "  {:<10} {:<20} at ({:.1}, {:.1})",
                e.kind.as_str(),
                e.name,
                e.position.x,
                e.position.y
            )?;
        }
        write!(
            f,
            "{} ticks, {} tasks ({} resolved, {} stale), {} kills in {:.1}s",
            self.stats.ticks,
            self.stats.enqueued,
            self.stats.resolved,
            self.stats.stale,
            self.stats.kills,
            self.elapsed.as_secs_f64()
        )
    }
}

// =============================================================================
// Roles
// =============================================================================

/// Everything the roles borrow from the coordinator.
#[derive(Clone, Copy)]
struct RoleContext<'a> {
    registry: &'a EntityRegistry,
    queue: &'a TaskQueue,
    feed: &'a KillFeed,
    counters: &'a Counters,
    running: &'a AtomicBool,
    bounds: MapBounds,
}

impl RoleContext<'_> {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Waits one interval. Returns `true` if shutdown began meanwhile.
fn pause(shutdown: &Receiver<()>, interval: Duration) -> bool {
    !matches!(shutdown.recv_timeout(interval), Err(RecvTimeoutError::Timeout))
}

fn detector_role(ctx: RoleContext<'_>, mut rng: ChaCha8Rng, shutdown: &Receiver<()>, interval: Duration) {
    tracing::debug!("detector role started");
    while ctx.is_running() {
        let enqueued = ctx.registry.with_entities(|entities| {
            step_entities(entities, &ctx.bounds, &mut rng);
            scan_engagements(entities, ctx.queue)
        });
        Counters::add(&ctx.counters.ticks, 1);
        Counters::add(&ctx.counters.enqueued, enqueued as u64);
        tracing::trace!(enqueued, "detector tick");

        if pause(shutdown, interval) {
            break;
        }
    }
    tracing::debug!("detector role stopped");
}

fn combat_role(ctx: RoleContext<'_>, dice: Box<dyn DiceSource>) {
    tracing::debug!("combat role started");
    let mut resolver = CombatResolver::new(dice);
    while let Some(task) = ctx.queue.pop() {
        let Some((attacker, defender)) = task.live_participants() else {
            Counters::add(&ctx.counters.stale, 1);
            tracing::trace!(?task, "discarding stale task");
            continue;
        };
        if let CombatOutcome::Kill(_) = resolver.fight(&attacker, &defender, ctx.feed) {
            Counters::add(&ctx.counters.kills, 1);
        }
        Counters::add(&ctx.counters.resolved, 1);
    }
    tracing::debug!("combat role drained the queue and stopped");
}

fn reporter_role(
    ctx: RoleContext<'_>,
    mut renderer: Option<Box<dyn FrameSink>>,
    shutdown: &Receiver<()>,
    interval: Duration,
) {
    tracing::debug!("reporter role started");
    let mut iteration = 0;
    while ctx.is_running() {
        if pause(shutdown, interval) {
            break;
        }
        iteration += 1;
        let frame = Frame::capture(iteration, ctx.bounds, ctx.registry);
        if let Some(renderer) = renderer.as_mut() {
            if let Err(error) = renderer.present(&frame) {
                tracing::warn!(%error, "frame could not be rendered; continuing");
            }
        }
        Counters::add(&ctx.counters.frames, 1);
        tracing::debug!(iteration, alive = frame.alive().count(), "frame captured");
    }
    tracing::debug!("reporter role stopped");
}

fn spawn_role<'scope, F>(
    scope: &'scope thread::Scope<'scope, '_>,
    role: &'static str,
    body: F,
) -> Result<thread::ScopedJoinHandle<'scope, ()>, SimulationError>
where
    F: FnOnce() + Send + 'scope,
{
    thread::Builder::new()
        .name(format!("skirmish-{role}"))
        .spawn_scoped(scope, body)
        .map_err(|source| SimulationError::Spawn { role, source })
}

fn join_role(
    handle: thread::ScopedJoinHandle<'_, ()>,
    role: &'static str,
    first_error: &mut Option<SimulationError>,
) {
    if handle.join().is_err() {
        tracing::error!(role, "role panicked");
        first_error.get_or_insert(SimulationError::RolePanicked(role));
    }
}

// =============================================================================
// Simulation
// =============================================================================

/// Owner of the registry, queue and kill feed for one concurrent run.
pub struct Simulation {
    config: SimulationConfig,
    registry: EntityRegistry,
    queue: TaskQueue,
    feed: KillFeed,
    counters: Counters,
    shared: Arc<Shared>,
    stop_tx: Sender<()>,
    stop_rx: Receiver<()>,
    rng: ChaCha8Rng,
    renderer: Option<Box<dyn FrameSink>>,
    dice: Option<Box<dyn DiceSource>>,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("phase", &self.phase())
            .field("entities", &self.registry.len())
            .field("queue", &self.queue)
            .field("feed", &self.feed)
            .field("has_renderer", &self.renderer.is_some())
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Creates an empty simulation in [`Phase::Initialized`].
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Config`] if `config` fails validation.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let rng = config
            .seed
            .map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        Ok(Self {
            config,
            registry: EntityRegistry::new(),
            queue: TaskQueue::new(),
            feed: KillFeed::new(),
            counters: Counters::default(),
            shared: Arc::new(Shared {
                phase: Mutex::new(Phase::Initialized),
                running: AtomicBool::new(false),
            }),
            stop_tx,
            stop_rx,
            rng,
            renderer: None,
            dice: None,
        })
    }

    /// Adds `initial_entities` randomly placed entities.
    ///
    /// Returns how many were added.
    ///
    /// # Errors
    ///
    /// [`SimulationError::AlreadyStarted`] after `run()`, or
    /// [`SimulationError::Config`] if a generated name is already taken.
    pub fn populate_random(&mut self) -> Result<usize, SimulationError> {
        self.ensure_initialized()?;
        let entities =
            factory::random_entities(self.config.initial_entities, &self.config.map, &mut self.rng);
        let count = entities.len();
        for entity in entities {
            self.registry.add(entity)?;
        }
        tracing::info!(
            count,
            width = self.config.map.width,
            height = self.config.map.height,
            "entities placed"
        );
        Ok(count)
    }

    /// Adds one entity at `position`.
    ///
    /// # Errors
    ///
    /// [`SimulationError::AlreadyStarted`] after `run()`;
    /// [`ConfigError::OutOfBounds`], [`ConfigError::InvalidName`] or
    /// [`ConfigError::DuplicateName`] wrapped in [`SimulationError::Config`].
    pub fn spawn(
        &self,
        kind: EntityKind,
        name: &str,
        position: DVec2,
    ) -> Result<Arc<Entity>, SimulationError> {
        self.ensure_initialized()?;
        let bounds = self.config.map;
        if !bounds.contains(position) {
            return Err(ConfigError::OutOfBounds {
                name: name.to_string(),
                x: position.x,
                y: position.y,
                width: bounds.width,
                height: bounds.height,
            }
            .into());
        }
        Ok(self.registry.add(Entity::new(name, kind, position))?)
    }

    /// Registers a kill sink.
    pub fn attach_sink(&self, sink: Arc<dyn KillSink>) {
        self.feed.attach(sink);
    }

    /// Sets where reporter frames go. Without one, frames are only counted.
    pub fn set_renderer(&mut self, renderer: impl FrameSink + 'static) {
        self.renderer = Some(Box::new(renderer));
    }

    /// Replaces the combat role's dice. Defaults to [`RandomDice`] seeded
    /// from the simulation's RNG.
    pub fn set_dice(&mut self, dice: impl DiceSource + 'static) {
        self.dice = Some(Box::new(dice));
    }

    /// Returns a handle that can end the run from another thread.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            signal: self.stop_tx.clone(),
            shared: Arc::clone(&self.shared),
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        *self.shared.phase.lock()
    }

    /// The shared entity registry.
    #[must_use]
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// The configuration this simulation was built with.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Drops dead entities from the registry. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Busy`] while roles are active.
    pub fn remove_dead(&self) -> Result<usize, SimulationError> {
        match self.phase() {
            Phase::Running | Phase::Stopping => Err(SimulationError::Busy),
            Phase::Initialized | Phase::Stopped => Ok(self.registry.remove_dead()),
        }
    }

    fn ensure_initialized(&self) -> Result<(), SimulationError> {
        if self.phase() == Phase::Initialized {
            Ok(())
        } else {
            Err(SimulationError::AlreadyStarted)
        }
    }

    /// Runs the three roles for the configured duration, or until a
    /// [`StopHandle`] fires, and returns the final report.
    ///
    /// Blocks the calling thread, which acts as coordinator.
    ///
    /// # Errors
    ///
    /// - [`SimulationError::AlreadyStarted`] if called twice
    /// - [`SimulationError::Spawn`] if a role thread could not be started;
    ///   roles already running are shut down first
    /// - [`SimulationError::RolePanicked`] if a role panicked
    pub fn run(&mut self) -> Result<SimulationReport, SimulationError> {
        self.ensure_initialized()?;

        let movement_rng = ChaCha8Rng::seed_from_u64(self.rng.gen());
        let dice = match self.dice.take() {
            Some(dice) => dice,
            None => Box::new(RandomDice::seeded(self.rng.gen())),
        };
        let renderer = self.renderer.take();
        let tick_interval = self.config.tick_interval();
        let report_interval = self.config.report_interval();
        let duration = self.config.duration();

        let ctx = RoleContext {
            registry: &self.registry,
            queue: &self.queue,
            feed: &self.feed,
            counters: &self.counters,
            running: &self.shared.running,
            bounds: self.config.map,
        };
        let shared = &self.shared;
        let stop_rx = &self.stop_rx;

        // Dropping the sender wakes every role sleeping on the receiver.
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);
        let mut shutdown_tx = Some(shutdown_tx);
        let mut begin_shutdown = move || {
            ctx.running.store(false, Ordering::Release);
            drop(shutdown_tx.take());
        };

        shared.running.store(true, Ordering::Release);
        shared.set_phase(Phase::Running);
        tracing::info!(
            entities = self.registry.len(),
            duration_ms = self.config.duration_ms,
            "simulation started"
        );
        let started = Instant::now();

        let result = thread::scope(|s| {
            let detector_shutdown = shutdown_rx.clone();
            let detector = spawn_role(s, "detector", move || {
                detector_role(ctx, movement_rng, &detector_shutdown, tick_interval);
            });
            let detector = match detector {
                Ok(handle) => handle,
                Err(error) => {
                    begin_shutdown();
                    return Err(error);
                }
            };

            let combat = match spawn_role(s, "combat", move || combat_role(ctx, dice)) {
                Ok(handle) => handle,
                Err(error) => {
                    begin_shutdown();
                    ctx.queue.stop();
                    return Err(error);
                }
            };

            let reporter_shutdown = shutdown_rx.clone();
            let reporter = spawn_role(s, "reporter", move || {
                reporter_role(ctx, renderer, &reporter_shutdown, report_interval);
            });
            let reporter = match reporter {
                Ok(handle) => handle,
                Err(error) => {
                    begin_shutdown();
                    ctx.queue.stop();
                    return Err(error);
                }
            };

            match stop_rx.recv_timeout(duration) {
                Ok(()) => tracing::info!("stop requested"),
                Err(_) => tracing::info!("run duration elapsed"),
            }

            shared.set_phase(Phase::Stopping);
            begin_shutdown();

            let mut first_error = None;
            join_role(detector, "detector", &mut first_error);
            // No producer is left; close after the detector's last push.
            ctx.queue.stop();
            join_role(combat, "combat", &mut first_error);
            join_role(reporter, "reporter", &mut first_error);
            first_error.map_or(Ok(()), Err)
        });

        self.shared.set_phase(Phase::Stopped);
        let elapsed = started.elapsed();
        result?;

        let survivors: Vec<EntitySnapshot> = self
            .registry
            .capture()
            .into_iter()
            .filter(|e| e.alive)
            .collect();
        let report = SimulationReport {
            total: self.registry.len(),
            survivors,
            stats: self.counters.snapshot(),
            elapsed,
        };
        tracing::info!(
            survivors = report.survivors.len(),
            total = report.total,
            kills = report.stats.kills,
            "simulation stopped"
        );
        Ok(report)
    }
}
