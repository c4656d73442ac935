//! Error types for spread rendering.

use thiserror::Error;

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while fetching artwork or drawing a spread.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The artwork fetch did not finish in time.
    #[error("artwork fetch timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The artwork could not be fetched.
    #[error("artwork fetch failed: {0}")]
    Fetch(String),

    /// The artwork reference is not acceptable for this source.
    #[error("invalid artwork reference: {0}")]
    InvalidRef(String),

    /// Artwork decoded to an image with no pixels.
    #[error("artwork has no pixels")]
    EmptyArtwork,

    /// Image decoding or encoding failed.
    #[error("{0}")]
    Image(#[from] image::ImageError),

    /// Local I/O failure.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}
