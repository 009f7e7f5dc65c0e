//! Flat text persistence for entity records.
//!
//! One record per line: `<Kind> <name> <x> <y>` (`Knight Arthur 123.5 456.7`).
//! Coordinates use the shortest decimal form that parses back to the same
//! `f64`, so a save/load cycle keeps positions bit for bit. Writes are best
//! effort: there is no fsync and no atomic rename.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, PersistenceError};
use crate::entity::EntityKind;

/// The persistable shape of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Entity kind.
    pub kind: EntityKind,
    /// Entity name. Must not contain whitespace.
    pub name: String,
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl fmt::Display for EntityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.kind, self.name, self.x, self.y)
    }
}

impl FromStr for EntityRecord {
    type Err = ConfigError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let malformed = |reason| ConfigError::MalformedRecord {
            line: line.to_string(),
            reason,
        };

        let mut fields = line.split_whitespace();
        let (Some(kind), Some(name), Some(x), Some(y)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(malformed("expected `<kind> <name> <x> <y>`"));
        };
        if fields.next().is_some() {
            return Err(malformed("trailing fields after y"));
        }

        let kind = kind.parse::<EntityKind>()?;
        let x = x.parse::<f64>().map_err(|_| malformed("x is not a number"))?;
        let y = y.parse::<f64>().map_err(|_| malformed("y is not a number"))?;
        if !x.is_finite() || !y.is_finite() {
            return Err(malformed("coordinates must be finite"));
        }

        Ok(Self {
            kind,
            name: name.to_string(),
            x,
            y,
        })
    }
}

/// Writes `records` to `path`, one line each, replacing any existing file.
///
/// Returns the number of records written.
///
/// # Errors
///
/// Returns [`PersistenceError::Io`] if the file cannot be created or written.
pub fn save<'a, I>(path: impl AsRef<Path>, records: I) -> Result<usize, PersistenceError>
where
    I: IntoIterator<Item = &'a EntityRecord>,
{
    let path = path.as_ref();
    let io_err = |source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut out = BufWriter::new(File::create(path).map_err(io_err)?);
    let mut written = 0;
    for record in records {
        writeln!(out, "{record}").map_err(io_err)?;
        written += 1;
    }
    out.flush().map_err(io_err)?;
    Ok(written)
}

/// Reads every record from `path`. Blank lines are skipped.
///
/// # Errors
///
/// Returns [`PersistenceError::Io`] if the file cannot be read, or
/// [`PersistenceError::Record`] for the first line that does not parse.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<EntityRecord>, PersistenceError> {
    Ok(load_numbered(path)?
        .into_iter()
        .map(|(_, record)| record)
        .collect())
}

/// Like [`load`], but pairs each record with its 1-based line number in the
/// file, blank lines included in the count.
///
/// # Errors
///
/// Same as [`load`].
pub fn load_numbered(
    path: impl AsRef<Path>,
) -> Result<Vec<(usize, EntityRecord)>, PersistenceError> {
    let path = path.as_ref();
    let io_err = |source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    };

    let reader = BufReader::new(File::open(path).map_err(io_err)?);
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(io_err)?;
        if line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 1;
        let record = line
            .parse()
            .map_err(|source| PersistenceError::Record { line_no, source })?;
        records.push((line_no, record));
    }
    Ok(records)
}
