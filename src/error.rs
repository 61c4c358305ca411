//! Error types and the three-level skip/continue control flow from §7.
//!
//! The source this tool is modeled on threw exceptions both to skip a single
//! DIE and to abandon a whole file. We use plain `Result` values instead:
//! [`DieOutcome`] and [`FileOutcome`] carry the "keep going" decision
//! explicitly so callers match on it rather than unwind.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Failures from the DWARF access layer (file mapping, ELF section lookup,
/// section decompression, `gimli` section loading).
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to map {path}: {source}")]
    Map {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed ELF: {0}")]
    MalformedElf(#[from] goblin::error::Error),

    #[error("failed to decompress section {section}")]
    Decompress { section: String },

    #[error("corrupted DWARF data: {0}")]
    Gimli(#[from] gimli::read::Error),
}

/// A recoverable, per-DIE failure (§7 level 1). Carries the DIE's section
/// offset so the caller can print `"<offset>: <reason>"` to stderr.
#[derive(Debug)]
pub struct DieError {
    pub offset: u64,
    pub reason: String,
}

impl fmt::Display for DieError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}: {}", self.offset, self.reason)
    }
}

impl DieError {
    pub fn new(offset: u64, reason: impl Into<String>) -> Self {
        DieError {
            offset,
            reason: reason.into(),
        }
    }
}

/// The outcome of examining one DIE: either it produced a value, or it must
/// be skipped for one of the two recoverable reasons in §7.
#[derive(Debug)]
pub enum DieOutcome<T> {
    Ok(T),
    /// Skip silently: the DIE was filtered by classification rules, not by
    /// an error. No diagnostic is printed.
    Filtered,
    /// Skip with a diagnostic: something about the DIE's data could not be
    /// processed (§7 level 1).
    Error(DieError),
}

/// The outcome of processing one input file (§7 level 2).
#[derive(Debug, Error)]
pub enum FileError {
    #[error("{path}: {source}")]
    Reader {
        path: PathBuf,
        #[source]
        source: ReaderError,
    },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
