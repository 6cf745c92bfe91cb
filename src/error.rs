//! Error types for mobeacon

use thiserror::Error;

/// Main error type for the mobeacon library
///
/// Only `Config` is fatal to callers: it is returned from initialization and
/// means the host wired the agent up wrong. `Database`, `Io` and `Transport`
/// never escape the tracking paths; the agent logs them and carries on.
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Beacon delivery error
    #[error("transport error: {0}")]
    Transport(String),
}

/// Result type alias for mobeacon
pub type Result<T> = std::result::Result<T, Error>;
