//! Error types for the sleep ledger
//!
//! Domain anomalies (inverted intervals, missing sleep time, missing events)
//! are never errors here; they are reported as alerts in the derived view.
//! This enum only covers failures at the edges: addressing, parsing input,
//! the actor mailbox, configuration and IO.

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Row index outside the fixed stage set
    #[error("Stage index out of range: {0} (expected 0..5)")]
    StageIndexOutOfRange(usize),

    /// Unknown sleep stage label
    #[error("Unknown sleep stage: {0}")]
    UnknownStage(String),

    /// Unknown respiratory event label
    #[error("Unknown respiratory event: {0}")]
    UnknownEvent(String),

    /// Time-of-day text could not be parsed or is off the input grid
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    /// Session command could not be parsed
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}
