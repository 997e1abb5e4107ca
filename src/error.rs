//! Errors surfaced to callers of the pipeline.
//!
//! Malformed trace lines are not errors (see [crate::parse::ParseStats]).
//! Only failing to get at a log in the first place is fatal.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A log file could not be opened.
    #[error("failed to open '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A log file was opened but reading from it failed part-way through.
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
