//! Built-in kill sinks.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::{KillEvent, KillSink};
use crate::error::SinkError;

/// Prints each kill to standard output as `[battle] <event>`.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    /// Creates a console sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl KillSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    fn on_kill(&self, event: &KillEvent) -> Result<(), SinkError> {
        let mut out = io::stdout().lock();
        writeln!(out, "[battle] {event}")?;
        Ok(())
    }
}

/// Appends each kill as one line to a text file.
///
/// The file is opened in append mode per event and closed again, so external
/// readers see complete lines. Writers within the process are serialized.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSink {
    /// Creates a sink appending to `path`. The file is created on first kill.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// Target file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KillSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn on_kill(&self, event: &KillEvent) -> Result<(), SinkError> {
        let _guard = self.write_lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{event}")?;
        Ok(())
    }
}

/// Keeps every delivered event in memory.
///
/// Events are retrieved with [`take_events`](Self::take_events), which drains
/// the log.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<KillEvent>>,
}

impl RecordingSink {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains and returns all recorded events in delivery order.
    pub fn take_events(&self) -> Vec<KillEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Number of events currently held.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }
}

impl KillSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    fn on_kill(&self, event: &KillEvent) -> Result<(), SinkError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Emits each kill as a structured `tracing` event at `INFO`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl KillSink for TracingSink {
    fn name(&self) -> &str {
        "tracing"
    }

    fn on_kill(&self, event: &KillEvent) -> Result<(), SinkError> {
        tracing::info!(
            killer = %event.killer,
            victim = %event.victim,
            attack_roll = event.attack_roll,
            defense_roll = event.defense_roll,
            "kill"
        );
        Ok(())
    }
}
