//! Error types for the combat simulation.
//!
//! Errors are split by the layer that reports them:
//! - [`ConfigError`]: bad input at creation/add time (unknown kinds, malformed
//!   records, duplicate names, out-of-bounds coordinates, invalid settings)
//! - [`PersistenceError`]: reading or writing saved entity files
//! - [`SinkError`]: a kill sink failed to deliver a notification
//! - [`SimulationError`]: lifecycle failures of the concurrent coordinator
//!
//! None of these are ever raised from inside a running role. Stale combat tasks
//! are not errors at all; sink failures are logged and swallowed by the kill feed.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Invalid input detected while building entities or settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The entity kind tag is not one of the known kinds.
    #[error("unknown entity kind `{0}`")]
    UnknownKind(String),

    /// A textual entity record could not be parsed.
    #[error("malformed record `{line}`: {reason}")]
    MalformedRecord {
        /// The offending input line.
        line: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// An entity with the same name already exists.
    #[error("an entity named `{0}` already exists")]
    DuplicateName(String),

    /// The name cannot be written to or read back from a record line.
    #[error("invalid entity name `{name}`: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// Initial coordinates fall outside the map.
    #[error("`{name}` at ({x}, {y}) is outside the {width}x{height} map")]
    OutOfBounds {
        /// Name of the rejected entity.
        name: String,
        /// Requested x coordinate.
        x: f64,
        /// Requested y coordinate.
        y: f64,
        /// Map width.
        width: f64,
        /// Map height.
        height: f64,
    },

    /// A configuration value is out of its valid range.
    #[error("invalid setting `{field}`: {reason}")]
    InvalidSetting {
        /// Name of the setting.
        field: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] io::Error),

    /// The configuration file is not valid JSON for [`SimulationConfig`](crate::config::SimulationConfig).
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure while saving or loading entity records.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The file could not be opened, read or written.
    #[error("i/o error on {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// A line in the file is not a valid entity record.
    #[error("line {line_no}: {source}")]
    Record {
        /// 1-based line number.
        line_no: usize,
        /// Parse failure for that line.
        #[source]
        source: ConfigError,
    },
}

/// A kill sink could not deliver an event.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing the notification failed.
    #[error("sink write failed: {0}")]
    Io(#[from] io::Error),
}

/// Failure of the concurrent simulation lifecycle.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Setup was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `run()` was called on a simulation that already left `Initialized`.
    #[error("simulation has already been started")]
    AlreadyStarted,

    /// The operating system refused to start a role thread.
    #[error("failed to spawn the {role} role: {source}")]
    Spawn {
        /// Role that could not be started.
        role: &'static str,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// A role thread panicked; its work is lost.
    #[error("the {0} role panicked")]
    RolePanicked(&'static str),

    /// Structural cleanup was requested while roles are still active.
    #[error("cannot modify the registry while the simulation is running")]
    Busy,
}
