//! Command-line and environment configuration.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::FixedOffset;
use clap::{Args, Parser, Subcommand};

use arcana_core::EngineConfig;
use arcana_render::{ArtworkSource, FileArtworkSource, HttpArtworkSource};

use crate::error::{BotError, BotResult};
use crate::router::DEFAULT_KEYWORD;
use crate::store::sheets::DEFAULT_BASE_URL;

#[derive(Parser)]
#[command(
    name = "arcana",
    about = "Arcana: tarot readings for chat",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the chat webhook plus health and readiness endpoints
    Serve {
        /// Port to listen on
        #[arg(long, env = "ARCANA_PORT", default_value_t = 8080)]
        port: u16,

        /// Bearer token required on POST /messages
        #[arg(long, env = "ARCANA_CHAT_TOKEN", hide_env_values = true)]
        chat_token: Option<String>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Read commands from stdin and print replies to stdout
    Console {
        /// Identity used as the requester of every reading
        #[arg(long, env = "ARCANA_USER", default_value = "console")]
        user: String,

        /// Directory spread images are written to (images are skipped if unset)
        #[arg(long, env = "ARCANA_IMAGE_DIR")]
        image_dir: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },
}

/// Options shared by every mode.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub art: ArtArgs,

    /// Word that addresses the bot (case-sensitive)
    #[arg(long, env = "ARCANA_KEYWORD", default_value = DEFAULT_KEYWORD)]
    pub keyword: String,

    /// Seed for reproducible draws
    #[arg(long, env = "ARCANA_SEED")]
    pub seed: Option<u64>,

    /// Offset from UTC, in minutes, used when showing reading history
    #[arg(
        long,
        env = "ARCANA_UTC_OFFSET_MINUTES",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    pub utc_offset_minutes: i32,

    /// Number of past readings shown by the history command
    #[arg(long, env = "ARCANA_HISTORY_LIMIT", default_value_t = 5)]
    pub history_limit: usize,
}

/// Where cards, spreads and readings are stored.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Directory of <Sheet>.csv files
    #[arg(long, env = "ARCANA_STORE_DIR")]
    pub store_dir: Option<PathBuf>,

    /// Spreadsheet document id (takes precedence over --store-dir)
    #[arg(long, env = "ARCANA_SHEETS_DOCUMENT_ID")]
    pub sheets_document_id: Option<String>,

    /// Bearer token for the spreadsheet API
    #[arg(long, env = "ARCANA_SHEETS_TOKEN", hide_env_values = true)]
    pub sheets_token: Option<String>,

    /// Spreadsheet API endpoint
    #[arg(long, env = "ARCANA_SHEETS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub sheets_base_url: String,
}

/// Where card artwork comes from.
#[derive(Args, Debug, Clone)]
pub struct ArtArgs {
    /// Local directory of card images
    #[arg(long, env = "ARCANA_ART_DIR", conflicts_with = "art_base_url")]
    pub art_dir: Option<PathBuf>,

    /// Base URL relative image references are resolved against
    #[arg(long, env = "ARCANA_ART_BASE_URL")]
    pub art_base_url: Option<String>,
}

impl CommonArgs {
    /// Engine settings derived from the command line.
    pub fn engine_config(&self) -> EngineConfig {
        let config = EngineConfig::default().with_history_limit(self.history_limit);
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }

    /// The offset history timestamps are shown in.
    pub fn utc_offset(&self) -> BotResult<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                BotError::Config(format!(
                    "UTC offset of {} minutes is out of range",
                    self.utc_offset_minutes
                ))
            })
    }
}

impl ArtArgs {
    /// The artwork source selected by these options.
    ///
    /// Without a directory, images are fetched over HTTP; absolute URLs in
    /// the cards table work even without a base URL.
    pub fn source(&self) -> Arc<dyn ArtworkSource> {
        match &self.art_dir {
            Some(dir) => Arc::new(FileArtworkSource::new(dir)),
            None => Arc::new(HttpArtworkSource::new(self.art_base_url.clone())),
        }
    }
}
