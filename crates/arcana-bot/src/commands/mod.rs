pub mod console;
pub mod serve;

use std::sync::Arc;
use std::time::Instant;

use log::{error, info};

use arcana_core::{CardCatalog, EngineConfig, ReadingEngine, TabularStore};
use arcana_render::{ArtworkCache, SpreadRenderer};

use crate::config::CommonArgs;
use crate::error::BotResult;
use crate::router::CommandRouter;
use crate::store::open_store;

/// Everything a running bot needs, wired together.
pub struct Services {
    pub catalog: Arc<CardCatalog>,
    pub store: Arc<dyn TabularStore>,
    pub router: Arc<CommandRouter>,
    pub config: EngineConfig,
    pub started_at: Instant,
}

/// Build the store, catalog, engine and router from the command line.
///
/// The catalog starts empty; call [`Services::load_catalog`] to fill it.
pub fn build_services(common: &CommonArgs) -> BotResult<Services> {
    let started_at = Instant::now();
    let config = common.engine_config();
    let store = open_store(&common.store)?;
    let catalog = Arc::new(CardCatalog::new());

    let engine = Arc::new(ReadingEngine::new(
        Arc::clone(&catalog),
        Arc::clone(&store),
        config.clone(),
    ));
    let renderer = SpreadRenderer::new(Arc::new(ArtworkCache::new(common.art.source())));
    let router = CommandRouter::new(engine, renderer, &common.keyword)
        .with_utc_offset(common.utc_offset()?)
        .with_start_time(started_at);

    Ok(Services {
        catalog,
        store,
        router: Arc::new(router),
        config,
        started_at,
    })
}

impl Services {
    /// Load the catalog with retries. Failure leaves the catalog empty.
    pub async fn load_catalog(&self) {
        match self
            .catalog
            .load_with_retry(self.store.as_ref(), &self.config)
            .await
        {
            Ok(()) => info!(
                "ready: {} cards, {} spreads",
                self.catalog.card_count(),
                self.catalog.spread_count()
            ),
            Err(e) => error!("{e}; continuing with an empty catalog"),
        }
    }
}
