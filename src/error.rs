//! Error types for teemux.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for teemux operations.
///
/// Setup-time errors (bad arguments, unopenable destinations, spawn
/// failures) are fatal and abort before the child runs. Per-write I/O
/// errors on already-open destinations are deliberately *not* modeled
/// here: the router logs and swallows them so one bad destination can
/// never stall the child or the remaining destinations.
#[derive(Error, Debug)]
pub enum TeemuxError {
    /// Invalid command-line usage.
    #[error("{0}")]
    Usage(String),

    /// A destination file could not be created.
    #[error("cannot create destination '{path}': {source}")]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The child command could not be launched.
    #[error("failed to launch command: {0}")]
    Spawn(String),

    /// PTY-related error.
    #[error("PTY error: {0}")]
    Pty(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TeemuxError {
    /// Whether this error should be followed by a usage reminder.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }
}

/// Convenience Result type for teemux operations.
pub type Result<T> = std::result::Result<T, TeemuxError>;
