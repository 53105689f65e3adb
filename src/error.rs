//! Error types for the tictactoe-rl crate

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid move: position {position} is already occupied")]
    InvalidMove { position: usize },

    #[error("position {position} is out of bounds for a {size}x{size} board")]
    InvalidPosition { position: usize, size: usize },

    #[error("game already over")]
    GameOver,

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },

    #[error("corrupt value table: {reason}")]
    CorruptTable { reason: String },

    #[error("unsupported value table format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("value table lock was poisoned by a panicking thread")]
    PoisonedLock,

    #[error("persistence worker is no longer running")]
    WorkerUnavailable,

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
