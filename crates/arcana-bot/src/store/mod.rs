//! Store backends for the bot.

pub mod csv;
pub mod sheets;

use std::sync::Arc;

use log::info;

use arcana_core::TabularStore;

use crate::config::StoreArgs;
use crate::error::{BotError, BotResult};

pub use self::csv::CsvStore;
pub use self::sheets::SheetsStore;

/// Open the store selected by the command line.
///
/// A spreadsheet document id takes precedence over a local directory.
pub fn open_store(args: &StoreArgs) -> BotResult<Arc<dyn TabularStore>> {
    if let Some(doc) = &args.sheets_document_id {
        info!("using spreadsheet store for document {doc}");
        return Ok(Arc::new(SheetsStore::new(
            &args.sheets_base_url,
            doc,
            args.sheets_token.clone(),
        )));
    }
    if let Some(dir) = &args.store_dir {
        info!("using CSV store in {}", dir.display());
        return Ok(Arc::new(CsvStore::open(dir)?));
    }
    Err(BotError::Config(
        "no store configured: pass --store-dir or --sheets-document-id".into(),
    ))
}
