//! Spread image rendering for Arcana.
//!
//! A reading is drawn as one PNG: a header with the spread name and the
//! question, then the cards in rows of up to five, each with its position
//! label and caption. Card artwork is fetched through an [`ArtworkSource`]
//! and cached per card for the life of the process; cards without usable
//! artwork get a generated placeholder.

pub mod artwork;
pub mod draw;
pub mod error;
pub mod font;
pub mod layout;
pub mod placeholder;
pub mod renderer;

pub use artwork::{ArtworkCache, ArtworkSource, FileArtworkSource, HttpArtworkSource, NoArtwork};
pub use error::{RenderError, RenderResult};
pub use layout::SpreadLayout;
pub use renderer::SpreadRenderer;
