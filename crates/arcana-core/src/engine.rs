//! The reading engine: draws cards into a spread and records the result.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use log::{debug, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::catalog::CardCatalog;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::reading::{Reading, ReadingRecord, ReadingSlot};
use crate::selector::select_random_cards;
use crate::store::TabularStore;

/// Result of saving a reading to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The row was appended.
    Saved,
    /// The append failed; the reading was still delivered.
    Failed(String),
}

/// Handle to a background save started by [`ReadingEngine::perform_reading`].
///
/// Dropping the handle does not cancel the save.
#[derive(Debug)]
pub struct PersistHandle {
    task: JoinHandle<PersistOutcome>,
}

impl PersistHandle {
    /// Whether the save has finished, successfully or not.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the save to finish.
    pub async fn outcome(self) -> PersistOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => PersistOutcome::Failed(format!("persist task aborted: {e}")),
        }
    }
}

/// A freshly drawn reading and the handle of its in-flight save.
#[derive(Debug)]
pub struct PerformedReading {
    /// The reading, complete and immutable.
    pub reading: Reading,
    /// Save status. There is no guarantee the row is visible to history yet.
    pub persist: PersistHandle,
}

/// Draws readings from the catalog and persists them.
pub struct ReadingEngine {
    catalog: Arc<CardCatalog>,
    store: Arc<dyn TabularStore>,
    config: EngineConfig,
    rng: Mutex<StdRng>,
}

impl ReadingEngine {
    /// Create an engine over a catalog and a store.
    pub fn new(catalog: Arc<CardCatalog>, store: Arc<dyn TabularStore>, config: EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            catalog,
            store,
            config,
            rng: Mutex::new(rng),
        }
    }

    /// The catalog readings are drawn from.
    pub fn catalog(&self) -> &Arc<CardCatalog> {
        &self.catalog
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Draw a reading for `spread_name` and start saving it in the background.
    ///
    /// Unknown spreads fail before any card is drawn or anything is saved.
    /// Must be called from within a Tokio runtime.
    pub fn perform_reading(
        &self,
        spread_name: &str,
        question: &str,
        requester_id: &str,
    ) -> EngineResult<PerformedReading> {
        let spread = self
            .catalog
            .spread(spread_name)
            .ok_or_else(|| EngineError::UnknownSpread(spread_name.to_string()))?;

        let cards = self.catalog.cards();
        let drawn = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            select_random_cards(&cards, spread.card_count(), &mut *rng)
        };
        if drawn.len() < spread.card_count() {
            warn!(
                "spread '{}' needs {} cards but only {} are loaded",
                spread.name,
                spread.card_count(),
                drawn.len()
            );
        }

        let slots = spread
            .position_labels
            .iter()
            .zip(drawn)
            .map(|(label, card)| ReadingSlot {
                label: label.clone(),
                card,
            })
            .collect();

        let reading = Reading {
            id: Uuid::new_v4(),
            spread_name: spread.name,
            question: question.to_string(),
            requester_id: requester_id.to_string(),
            slots,
            created_at: Utc::now(),
        };

        let persist = self.spawn_persist(reading.to_record(), reading.id);
        Ok(PerformedReading { reading, persist })
    }

    fn spawn_persist(&self, record: ReadingRecord, id: Uuid) -> PersistHandle {
        let store = Arc::clone(&self.store);
        let range = self.config.readings_range.clone();
        let task = tokio::spawn(async move {
            match store.append_row(&range, record.to_row()).await {
                Ok(()) => {
                    debug!("reading {id} saved");
                    PersistOutcome::Saved
                }
                Err(e) => {
                    warn!("failed to save reading {id}: {e}");
                    PersistOutcome::Failed(e.to_string())
                }
            }
        });
        PersistHandle { task }
    }

    /// The most recent readings of one requester, newest first.
    ///
    /// `limit` defaults to the configured history limit.
    pub async fn history(
        &self,
        requester_id: &str,
        limit: Option<usize>,
    ) -> EngineResult<Vec<ReadingRecord>> {
        let limit = limit.unwrap_or(self.config.history_limit);
        let rows = self.store.read_range(&self.config.readings_range).await?;

        let mut records: Vec<ReadingRecord> = rows
            .iter()
            .filter_map(|row| ReadingRecord::from_row(row))
            .filter(|r| r.requester_id == requester_id)
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records.truncate(limit);
        Ok(records)
    }
}
