//! Per-run attendance record store.
//!
//! A flat file with a `Name,Time` header, truncated at every run start.
//! At most one record per name per run; first sighting wins.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

const HEADER: &str = "Name,Time";

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("attendance file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Append-only, name-deduplicated attendance store for one run.
///
/// Every [`record_if_absent`](Self::record_if_absent) call re-reads the whole
/// file before appending. Linear in records-seen-so-far, which is fine for a
/// bounded headcount; names must not contain commas (they come from file
/// stems, and the format stays naive CSV for compatibility).
pub struct AttendanceLedger {
    path: PathBuf,
}

impl AttendanceLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncate the backing file and write the header. Starts a fresh epoch:
    /// every name becomes recordable again.
    pub fn reset(&self) -> Result<(), LedgerError> {
        fs::write(&self.path, format!("{HEADER}\n")).map_err(|source| LedgerError::Io {
            path: self.path.clone(),
            source,
        })?;
        tracing::info!(path = %self.path.display(), "attendance file reset");
        Ok(())
    }

    /// Append `name` with the current wall-clock time unless it already has a
    /// record this epoch. Returns whether a new record was written.
    pub fn record_if_absent(&self, name: &str) -> Result<bool, LedgerError> {
        let io_err = |source| LedgerError::Io {
            path: self.path.clone(),
            source,
        };

        let contents = fs::read_to_string(&self.path).map_err(io_err)?;
        let already_present = contents
            .lines()
            .filter_map(|line| line.split(',').next())
            .any(|recorded| recorded == name);
        if already_present {
            return Ok(false);
        }

        let timestamp = chrono::Local::now().format("%H:%M:%S");
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        writeln!(file, "{name},{timestamp}").map_err(io_err)?;

        tracing::info!(name, %timestamp, "attendance recorded");
        Ok(true)
    }
}
