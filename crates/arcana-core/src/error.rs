//! Error types for the Arcana core.

use thiserror::Error;

/// Result type for tabular store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a [`TabularStore`](crate::store::TabularStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The range identifier could not be parsed.
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// The store could not be reached or refused the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store answered with data that could not be interpreted.
    #[error("malformed store response: {0}")]
    Malformed(String),

    /// Local I/O failure.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading the card catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The cards or spreads table could not be read.
    #[error("failed to read {table}: {source}")]
    Read {
        /// Logical table that failed ("cards" or "spreads").
        table: &'static str,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// Every load attempt failed.
    #[error("catalog load failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The error from the final attempt.
        last: Box<CatalogError>,
    },
}

/// Result type for reading engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by the reading engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The requested spread is not defined in the catalog.
    #[error("unknown spread: {0}")]
    UnknownSpread(String),

    /// Reading history could not be fetched.
    #[error("history unavailable: {0}")]
    History(#[from] StoreError),
}
