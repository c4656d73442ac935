//! Configuration for the catalog and reading engine.

use std::time::Duration;

/// Store ranges, retry policy and draw settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// RNG seed for reproducible draws. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Range holding the cards table, header excluded.
    pub cards_range: String,
    /// Range holding the spreads table, header excluded.
    pub spreads_range: String,
    /// Range readings are appended to and read back from.
    pub readings_range: String,
    /// Maximum number of records returned by a history query.
    pub history_limit: usize,
    /// Catalog load attempts at startup.
    pub load_attempts: u32,
    /// Pause between catalog load attempts.
    pub load_retry_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            cards_range: "Cards!A2:E".to_string(),
            spreads_range: "Spreads!A2:Z".to_string(),
            readings_range: "Readings!A2:E".to_string(),
            history_limit: 5,
            load_attempts: 3,
            load_retry_delay: Duration::from_secs(5),
        }
    }
}

impl EngineConfig {
    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the history limit (at least 1).
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    /// Set the catalog retry policy. At least one attempt is always made.
    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.load_attempts = attempts.max(1);
        self.load_retry_delay = delay;
        self
    }
}
