//! ASCII rendering of registry snapshots.
//!
//! The reporter role captures a [`Frame`] each interval and hands it to a
//! [`FrameSink`]. Rendering is read-only and never feeds back into the run.
//!
//! A frame is drawn as a grid of `map / scale` cells. Each cell shows `.` when
//! empty, the kind symbol (`K`, `D`, `E`) for one living entity, and `*` when
//! several living entities share the cell. Large maps are drawn at a coarser
//! scale so neither side exceeds [`MAX_GRID_CELLS`].

use std::fmt::Write as _;
use std::io::{self, Write};

use crate::entity::{EntityKind, EntitySnapshot};
use crate::error::SinkError;
use crate::map::MapBounds;
use crate::registry::EntityRegistry;

/// Map units per grid cell used by the command-line renderer.
pub const DEFAULT_SCALE: f64 = 2.0;

/// Upper bound on grid columns and rows.
pub const MAX_GRID_CELLS: usize = 200;

/// A read-only capture of the registry at one reporting tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// 1-based reporting tick.
    pub iteration: u64,
    /// Map extent at capture time.
    pub bounds: MapBounds,
    /// Every registered entity, dead ones included.
    pub entities: Vec<EntitySnapshot>,
}

impl Frame {
    /// Captures the registry under its shared lock.
    #[must_use]
    pub fn capture(iteration: u64, bounds: MapBounds, registry: &EntityRegistry) -> Self {
        Self {
            iteration,
            bounds,
            entities: registry.capture(),
        }
    }

    /// Living entities in registry order.
    pub fn alive(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.entities.iter().filter(|e| e.alive)
    }

    /// Living entities per kind, indexed by [`EntityKind::index`].
    #[must_use]
    pub fn alive_counts(&self) -> [usize; 3] {
        let mut counts = [0; 3];
        for e in self.alive() {
            counts[e.kind.index()] += 1;
        }
        counts
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn cells(extent: f64, scale: f64) -> usize {
    ((extent / scale).ceil() as usize).max(1)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn cell_of(coord: f64, scale: f64, cells: usize) -> usize {
    // Positions on the far edge land in the last cell.
    ((coord.max(0.0) / scale) as usize).min(cells - 1)
}

/// Renders `frame` as a framed ASCII map with a header and a legend.
///
/// A `scale` that is not finite and positive falls back to [`DEFAULT_SCALE`].
/// The scale is raised as needed to keep the grid within [`MAX_GRID_CELLS`]
/// on each side.
///
/// # Example
///
/// ```
/// use glam::DVec2;
/// use skirmish_core::entity::{Entity, EntityKind};
/// use skirmish_core::map::MapBounds;
/// use skirmish_core::registry::EntityRegistry;
/// use skirmish_core::render::{render_map, Frame};
///
/// let registry = EntityRegistry::new();
/// registry.add(Entity::new("K", EntityKind::Knight, DVec2::new(0.0, 0.0))).unwrap();
/// let frame = Frame::capture(1, MapBounds::new(4.0, 2.0), &registry);
///
/// let text = render_map(&frame, 2.0);
/// assert!(text.contains("|K.|"));
/// ```
#[must_use]
pub fn render_map(frame: &Frame, scale: f64) -> String {
    let scale = if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        DEFAULT_SCALE
    };
    #[allow(clippy::cast_precision_loss)]
    let limit = MAX_GRID_CELLS as f64;
    let scale = scale
        .max(frame.bounds.width / limit)
        .max(frame.bounds.height / limit);
    let cols = cells(frame.bounds.width, scale);
    let rows = cells(frame.bounds.height, scale);

    let mut grid = vec![vec!['.'; cols]; rows];
    for e in frame.alive() {
        let cell = &mut grid[cell_of(e.position.y, scale, rows)][cell_of(e.position.x, scale, cols)];
        *cell = if *cell == '.' { e.kind.symbol() } else { '*' };
    }

    let counts = frame.alive_counts();
    let alive: usize = counts.iter().sum();
    let border = format!("  +{}+", "-".repeat(cols));

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Map {}x{} (iteration {})",
        frame.bounds.width, frame.bounds.height, frame.iteration
    );
    let _ = writeln!(
        out,
        "Alive: {alive} | K:{} D:{} E:{}",
        counts[EntityKind::Knight.index()],
        counts[EntityKind::Druid.index()],
        counts[EntityKind::Elf.index()],
    );
    let _ = writeln!(out, "{border}");
    for row in &grid {
        let line: String = row.iter().collect();
        let _ = writeln!(out, "  |{line}|");
    }
    let _ = writeln!(out, "{border}");
    let _ = writeln!(out, "  Legend: K=Knight, D=Druid, E=Elf, *=several");
    out
}

/// Consumer of reporter frames.
///
/// Owned by the reporter role for the length of a run.
pub trait FrameSink: Send {
    /// Presents one frame.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if output failed. The reporter logs it and keeps
    /// running.
    fn present(&mut self, frame: &Frame) -> Result<(), SinkError>;
}

/// Writes rendered frames to any [`Write`] target.
#[derive(Debug)]
pub struct TerminalRenderer<W> {
    out: W,
    scale: f64,
}

impl TerminalRenderer<io::Stdout> {
    /// Renders to standard output at [`DEFAULT_SCALE`].
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout(), DEFAULT_SCALE)
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    /// Renders to `out` with `scale` map units per cell.
    #[must_use]
    pub fn new(out: W, scale: f64) -> Self {
        Self { out, scale }
    }

    /// Returns the writer, e.g. to inspect a buffer in tests.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> FrameSink for TerminalRenderer<W> {
    fn present(&mut self, frame: &Frame) -> Result<(), SinkError> {
        let text = render_map(frame, self.scale);
        writeln!(self.out)?;
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}
