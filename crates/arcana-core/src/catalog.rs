//! The card catalog: cards and spread definitions loaded from the store.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::card::Card;
use crate::config::EngineConfig;
use crate::error::CatalogError;
use crate::spread::SpreadDefinition;
use crate::store::TabularStore;

/// An immutable view of the catalog at one point in time.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    /// All cards, in table order.
    pub cards: Arc<[Card]>,
    /// All spreads, in table order.
    pub spreads: Arc<[SpreadDefinition]>,
    /// When this snapshot was loaded. `None` for the initial empty catalog.
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Holds the loaded cards and spreads.
///
/// Readers get a cheap [`Arc`] snapshot. A successful [`load`](Self::load)
/// swaps in a new snapshot in one step; a failed load leaves the previous
/// snapshot in place.
#[derive(Debug, Default)]
pub struct CardCatalog {
    current: RwLock<Arc<CatalogSnapshot>>,
}

impl CardCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog pre-populated with cards and spreads.
    pub fn with_contents(cards: Vec<Card>, spreads: Vec<SpreadDefinition>) -> Self {
        let catalog = Self::new();
        catalog.replace(CatalogSnapshot {
            cards: cards.into(),
            spreads: spreads.into(),
            loaded_at: Some(Utc::now()),
        });
        catalog
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// All loaded cards.
    pub fn cards(&self) -> Arc<[Card]> {
        Arc::clone(&self.snapshot().cards)
    }

    /// All loaded spreads.
    pub fn spreads(&self) -> Arc<[SpreadDefinition]> {
        Arc::clone(&self.snapshot().spreads)
    }

    /// Look up a spread by key.
    pub fn spread(&self, name: &str) -> Option<SpreadDefinition> {
        self.snapshot()
            .spreads
            .iter()
            .find(|s| s.name == name)
            .cloned()
    }

    /// Number of loaded cards.
    pub fn card_count(&self) -> usize {
        self.snapshot().cards.len()
    }

    /// Number of loaded spreads.
    pub fn spread_count(&self) -> usize {
        self.snapshot().spreads.len()
    }

    /// Whether no cards are loaded.
    pub fn is_empty(&self) -> bool {
        self.snapshot().cards.is_empty()
    }

    /// Load cards and spreads from the store, replacing the current contents.
    ///
    /// Both tables are fetched before anything is replaced.
    pub async fn load(
        &self,
        store: &dyn TabularStore,
        config: &EngineConfig,
    ) -> Result<(), CatalogError> {
        let card_rows = store
            .read_range(&config.cards_range)
            .await
            .map_err(|source| CatalogError::Read {
                table: "cards",
                source,
            })?;
        let spread_rows = store
            .read_range(&config.spreads_range)
            .await
            .map_err(|source| CatalogError::Read {
                table: "spreads",
                source,
            })?;

        let mut seen_ids = HashSet::new();
        let mut cards = Vec::with_capacity(card_rows.len());
        for (i, row) in card_rows.iter().enumerate() {
            match Card::from_row(row) {
                Some(card) if seen_ids.insert(card.id) => cards.push(card),
                Some(card) => warn!("skipping duplicate card id {} at row {}", card.id, i + 1),
                None => warn!("skipping malformed card row {}", i + 1),
            }
        }

        let mut spreads: Vec<SpreadDefinition> = Vec::with_capacity(spread_rows.len());
        for (i, row) in spread_rows.iter().enumerate() {
            match SpreadDefinition::from_row(row) {
                Some(def) if spreads.iter().any(|s| s.name == def.name) => {
                    warn!("skipping duplicate spread '{}' at row {}", def.name, i + 1)
                }
                Some(def) => spreads.push(def),
                None => warn!("skipping malformed spread row {}", i + 1),
            }
        }

        info!(
            "catalog loaded: {} cards, {} spreads",
            cards.len(),
            spreads.len()
        );
        self.replace(CatalogSnapshot {
            cards: cards.into(),
            spreads: spreads.into(),
            loaded_at: Some(Utc::now()),
        });
        Ok(())
    }

    /// Load with the configured number of attempts and a fixed pause between them.
    pub async fn load_with_retry(
        &self,
        store: &dyn TabularStore,
        config: &EngineConfig,
    ) -> Result<(), CatalogError> {
        let attempts = config.load_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.load(store, config).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!("catalog load attempt {attempt}/{attempts} failed: {e}");
                    if attempt >= attempts {
                        return Err(CatalogError::RetriesExhausted {
                            attempts,
                            last: Box::new(e),
                        });
                    }
                }
            }
            attempt += 1;
            tokio::time::sleep(config.load_retry_delay).await;
        }
    }

    fn replace(&self, snapshot: CatalogSnapshot) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(snapshot);
    }
}
