//! Error types for the bot binary.

use thiserror::Error;

use arcana_core::{EngineError, StoreError};

/// Result type for bot operations.
pub type BotResult<T> = Result<T, BotError>;

/// Errors surfaced by the bot's commands and setup.
#[derive(Debug, Error)]
pub enum BotError {
    /// Invalid or incomplete configuration.
    #[error("configuration: {0}")]
    Config(String),

    /// Store setup or access failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The reading engine failed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Local I/O failure.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors raised while delivering replies.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The message exceeds what the transport accepts.
    #[error("message of {0} characters exceeds the transport limit")]
    TooLong(usize),

    /// Local I/O failure while writing a reply.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}
