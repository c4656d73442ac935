//! Core of the Arcana tarot bot.
//!
//! Provides the card and spread model, the tabular store abstraction the bot
//! persists through, the card catalog, random card selection, the reading
//! engine, and text formatting of readings and reading history.

pub mod card;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod formatter;
pub mod reading;
pub mod selector;
pub mod spread;
pub mod store;

pub use card::{Card, DrawnCard, Orientation};
pub use catalog::{CardCatalog, CatalogSnapshot};
pub use config::EngineConfig;
pub use engine::{PerformedReading, PersistHandle, PersistOutcome, ReadingEngine};
pub use error::{CatalogError, EngineError, EngineResult, StoreError, StoreResult};
pub use formatter::{format_history, format_reading};
pub use reading::{Reading, ReadingRecord, ReadingSlot};
pub use selector::select_random_cards;
pub use spread::{SpreadDefinition, SpreadKind};
pub use store::{MemoryStore, RangeRef, Row, TabularStore};
