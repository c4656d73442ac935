//! Command parsing and dispatch.
//!
//! Messages addressed to the bot look like `<keyword> <sub> [question]`.
//! The keyword must match exactly; the subcommand is matched without case.
//! Replies are split into chunks the chat platform accepts, with the spread
//! image on the first chunk only.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{FixedOffset, Offset, Utc};
use log::{debug, error, info, warn};

use arcana_core::spread::SpreadKind;
use arcana_core::{
    EngineError, PersistHandle, PersistOutcome, ReadingEngine, format_history, format_reading,
};
use arcana_render::SpreadRenderer;

use crate::error::{BotResult, TransportResult};
use crate::transport::{ChatTransport, InboundEvent};

/// Keyword used when none is configured.
pub const DEFAULT_KEYWORD: &str = "tarot";

/// Maximum characters per outgoing message.
pub const MESSAGE_CHUNK: usize = 1900;

const LOADING_NOTICE: &str =
    "The cards are still being shuffled. Please try again in a moment.";
pub(crate) const RETRY_NOTICE: &str = "Something went wrong while consulting the cards. Please try again later.";
const RENDER_NOTICE: &str = "_The spread image could not be drawn this time._";

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Usage overview.
    Help,
    /// List the loaded spreads.
    Spreads,
    /// Catalog counts and uptime.
    Status,
    /// The requester's recent readings.
    History,
    /// Draw a reading.
    Reading {
        /// Spread key, exactly as typed.
        spread: String,
        /// Everything after the spread key.
        question: String,
    },
}

/// Split off the first whitespace-delimited token.
fn next_token(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim()),
        None => (s, ""),
    }
}

/// Parse `text` as a command addressed by `keyword`.
///
/// Returns `None` when the message is not addressed to the bot.
pub fn parse_command(keyword: &str, text: &str) -> Option<Command> {
    let (first, rest) = next_token(text);
    if first != keyword {
        return None;
    }
    let (sub, question) = next_token(rest);
    Some(match sub {
        "" | "help" => Command::Help,
        "spreads" => Command::Spreads,
        "status" => Command::Status,
        "history" => Command::History,
        _ => Command::Reading {
            spread: sub.to_string(),
            question: question.to_string(),
        },
    })
}

/// A reply before it is split for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Full reply text.
    pub text: String,
    /// PNG attached to the first message.
    pub image: Option<Vec<u8>>,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }
}

/// Split `text` into pieces of at most `max` characters.
///
/// Splits fall on line boundaries; a single line longer than `max` is cut
/// hard. Blank lines inside a piece are kept, but a piece that would hold
/// nothing but whitespace is not sent.
pub fn chunk_text(text: &str, max: usize) -> Vec<String> {
    let max = max.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    let mut started = false;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        let needed = if started { current_len + 1 + line_len } else { line_len };
        if needed <= max {
            if started {
                current.push('\n');
            }
            current.push_str(line);
            current_len = needed;
            started = true;
            continue;
        }

        if started && !current.trim().is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        current.clear();
        started = true;
        if line_len <= max {
            current.push_str(line);
            current_len = line_len;
        } else {
            let chars: Vec<char> = line.chars().collect();
            let mut pieces = chars.chunks(max).map(|c| c.iter().collect::<String>()).peekable();
            while let Some(piece) = pieces.next() {
                if pieces.peek().is_some() {
                    chunks.push(piece);
                } else {
                    current_len = piece.chars().count();
                    current = piece;
                }
            }
        }
    }
    if !current.trim().is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Send `reply` through `transport`, chunked, image on the first message.
pub async fn deliver(reply: Reply, transport: &dyn ChatTransport) -> TransportResult<()> {
    let mut chunks = chunk_text(&reply.text, MESSAGE_CHUNK).into_iter();
    let first = chunks.next().unwrap_or_default();
    transport.reply(&first, reply.image.as_deref()).await?;
    for chunk in chunks {
        transport.send_followup(&chunk).await?;
    }
    Ok(())
}

/// Compact uptime such as `2d 3h 4m 5s`, leading zero units omitted.
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let (d, h, m, s) = (secs / 86_400, secs / 3600 % 24, secs / 60 % 60, secs % 60);
    let parts = [(d, "d"), (h, "h"), (m, "m"), (s, "s")];
    let start = parts.iter().position(|(n, _)| *n > 0).unwrap_or(3);
    parts[start..]
        .iter()
        .map(|(n, unit)| format!("{n}{unit}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Dispatches inbound chat messages to the reading engine.
pub struct CommandRouter {
    engine: Arc<ReadingEngine>,
    renderer: SpreadRenderer,
    keyword: String,
    utc_offset: FixedOffset,
    started_at: Instant,
    saves: Mutex<Vec<PersistHandle>>,
}

impl CommandRouter {
    /// Create a router answering to `keyword`.
    pub fn new(engine: Arc<ReadingEngine>, renderer: SpreadRenderer, keyword: &str) -> Self {
        Self {
            engine,
            renderer,
            keyword: keyword.to_string(),
            utc_offset: Utc.fix(),
            started_at: Instant::now(),
            saves: Mutex::new(Vec::new()),
        }
    }

    /// Show history timestamps in `offset`.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// Count uptime from `started_at`.
    pub fn with_start_time(mut self, started_at: Instant) -> Self {
        self.started_at = started_at;
        self
    }

    /// Wait for every reading save started so far.
    pub async fn drain_saves(&self) {
        let pending = std::mem::take(&mut *self.saves.lock().unwrap_or_else(|e| e.into_inner()));
        for handle in pending {
            if let PersistOutcome::Failed(e) = handle.outcome().await {
                warn!("reading was not saved: {e}");
            }
        }
    }

    fn track_save(&self, handle: PersistHandle) {
        let mut saves = self.saves.lock().unwrap_or_else(|e| e.into_inner());
        saves.retain(|h| !h.is_finished());
        saves.push(handle);
    }

    /// Handle one event end to end. Ignored events send nothing.
    pub async fn handle(
        &self,
        event: &InboundEvent,
        transport: &dyn ChatTransport,
    ) -> TransportResult<()> {
        match self.respond(event).await {
            Some(reply) => deliver(reply, transport).await,
            None => Ok(()),
        }
    }

    /// The reply for `event`, or `None` if the bot should stay silent.
    pub async fn respond(&self, event: &InboundEvent) -> Option<Reply> {
        if event.is_bot {
            return None;
        }
        let command = parse_command(&self.keyword, &event.text)?;
        debug!("{} -> {command:?}", event.author_id);

        Some(match self.run(command, event).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("command from {} failed: {e}", event.author_id);
                Reply::text(RETRY_NOTICE)
            }
        })
    }

    async fn run(&self, command: Command, event: &InboundEvent) -> BotResult<Reply> {
        match command {
            Command::Help => Ok(Reply::text(self.help())),
            Command::Spreads => Ok(Reply::text(self.spreads())),
            Command::Status => Ok(Reply::text(self.status())),
            Command::History => {
                let records = self.engine.history(&event.author_id, None).await?;
                Ok(Reply::text(format_history(&records, self.utc_offset)))
            }
            Command::Reading { spread, question } => {
                self.reading(&spread, &question, &event.author_id).await
            }
        }
    }

    async fn reading(&self, spread: &str, question: &str, requester: &str) -> BotResult<Reply> {
        if self.engine.catalog().is_empty() {
            return Ok(Reply::text(LOADING_NOTICE));
        }

        let performed = match self.engine.perform_reading(spread, question, requester) {
            Ok(performed) => performed,
            Err(EngineError::UnknownSpread(name)) => {
                return Ok(Reply::text(format!(
                    "There is no spread called `{name}`. Try `{} spreads` to see them all.",
                    self.keyword
                )));
            }
            Err(e) => return Err(e.into()),
        };
        info!(
            "reading {} for {requester}: {} cards in '{spread}'",
            performed.reading.id,
            performed.reading.slots.len()
        );

        let reading = performed.reading;
        self.track_save(performed.persist);

        let mut text = format_reading(&reading);
        let image = self.renderer.render(&reading).await;
        if image.is_none() {
            text.push_str("\n\n");
            text.push_str(RENDER_NOTICE);
        }
        Ok(Reply { text, image })
    }

    fn help(&self) -> String {
        let k = &self.keyword;
        let mut out = String::from("**Arcana tarot**\n");
        out.push_str(&format!("`{k} <spread> [question]` draws a reading\n"));
        out.push_str(&format!("`{k} spreads` lists the available spreads\n"));
        out.push_str(&format!("`{k} history` shows your recent readings\n"));
        out.push_str(&format!("`{k} status` shows what is loaded\n"));
        out.push_str(&format!("`{k} help` shows this message\n"));
        out.push_str(&format!("\nExample: `{k} three How will this week go?`"));
        out
    }

    fn spreads(&self) -> String {
        let spreads = self.engine.catalog().spreads();
        if spreads.is_empty() {
            return LOADING_NOTICE.to_string();
        }
        let mut out = String::from("**Spreads**\n");
        for spread in spreads.iter() {
            let kind = SpreadKind::from_key(&spread.name);
            out.push_str(&format!(
                "`{}` {} ({} cards): {}\n",
                spread.name,
                kind.display_name(),
                spread.card_count(),
                kind.description()
            ));
        }
        out.trim_end().to_string()
    }

    fn status(&self) -> String {
        let catalog = self.engine.catalog();
        format!(
            "**Status**\nCards loaded: {}\nSpreads loaded: {}\nUptime: {}",
            catalog.card_count(),
            catalog.spread_count(),
            format_uptime(self.started_at.elapsed())
        )
    }
}

#[cfg(test)]
mod tests {
    use arcana_core::{
        Card, CardCatalog, EngineConfig, MemoryStore, SpreadDefinition, TabularStore,
    };
    use arcana_render::{ArtworkCache, NoArtwork};

    use super::*;
    use crate::transport::CollectingTransport;

    fn deck(n: u32) -> Vec<Card> {
        (0..n)
            .map(|id| Card {
                id,
                name: format!("Card {id}"),
                kind: "Major".to_string(),
                meaning: format!("Meaning of card {id}"),
                image_ref: None,
            })
            .collect()
    }

    fn spreads() -> Vec<SpreadDefinition> {
        vec![
            SpreadDefinition::new("one", ["Answer"]),
            SpreadDefinition::new("three", ["Past", "Present", "Future"]),
            SpreadDefinition::new("empty", Vec::<String>::new()),
        ]
    }

    fn router_with(catalog: CardCatalog, store: Arc<MemoryStore>) -> CommandRouter {
        let engine = Arc::new(ReadingEngine::new(
            Arc::new(catalog),
            store as Arc<dyn TabularStore>,
            EngineConfig::default().with_seed(11),
        ));
        let renderer = SpreadRenderer::new(Arc::new(ArtworkCache::new(Arc::new(NoArtwork))));
        CommandRouter::new(engine, renderer, DEFAULT_KEYWORD)
    }

    fn router() -> (CommandRouter, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let r = router_with(CardCatalog::with_contents(deck(22), spreads()), store.clone());
        (r, store)
    }

    fn user(text: &str) -> InboundEvent {
        InboundEvent::from_user("u1", text)
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("tarot", "tarot"), Some(Command::Help));
        assert_eq!(parse_command("tarot", "  tarot  help "), Some(Command::Help));
        assert_eq!(
            parse_command("tarot", "tarot HELP"),
            Some(Command::Reading {
                spread: "HELP".into(),
                question: String::new()
            })
        );
        assert_eq!(parse_command("tarot", "tarot spreads"), Some(Command::Spreads));
        assert_eq!(parse_command("tarot", "tarot history"), Some(Command::History));
        assert_eq!(
            parse_command("tarot", "tarot Three  will it   rain?"),
            Some(Command::Reading {
                spread: "Three".into(),
                question: "will it   rain?".into()
            })
        );
    }

    #[test]
    fn ignores_unaddressed_messages() {
        assert_eq!(parse_command("tarot", "hello there"), None);
        assert_eq!(parse_command("tarot", "Tarot one"), None);
        assert_eq!(parse_command("tarot", "tarotone"), None);
        assert_eq!(parse_command("tarot", ""), None);
    }

    #[test]
    fn chunking_keeps_short_text_whole() {
        assert_eq!(chunk_text("a\nb", 1900), vec!["a\nb"]);
        assert_eq!(chunk_text("", 1900), vec![""]);
    }

    #[test]
    fn chunking_splits_on_lines() {
        let text = format!("{}\n{}\n{}", "a".repeat(8), "b".repeat(8), "c".repeat(3));
        assert_eq!(
            chunk_text(&text, 12),
            vec!["a".repeat(8), format!("{}\n{}", "b".repeat(8), "c".repeat(3))]
        );
    }

    #[test]
    fn chunking_keeps_leading_blank_lines() {
        assert_eq!(chunk_text("\n\nabc", 10), vec!["\n\nabc"]);
        let text = format!("{}\n\n{}", "a".repeat(10), "b".repeat(3));
        assert_eq!(chunk_text(&text, 10), vec!["a".repeat(10), format!("\n{}", "b".repeat(3))]);
        assert_eq!(chunk_text("aaaa\n\nbbbb", 4), vec!["aaaa", "bbbb"]);
    }

    #[test]
    fn chunking_hard_splits_long_lines() {
        let chunks = chunk_text(&"x".repeat(25), 10);
        assert_eq!(chunks, vec!["x".repeat(10), "x".repeat(10), "x".repeat(5)]);
    }

    #[tokio::test]
    async fn long_reply_is_chunked_with_image_first() {
        let text = format!("{}\n{}", "y".repeat(1500), "z".repeat(599));
        assert_eq!(text.chars().count(), 2100);

        let transport = CollectingTransport::new();
        deliver(
            Reply {
                text,
                image: Some(vec![9, 9]),
            },
            &transport,
        )
        .await
        .unwrap();

        let messages = transport.take().await;
        assert!(messages.len() >= 2);
        assert!(messages.iter().all(|m| m.text.chars().count() <= MESSAGE_CHUNK));
        assert!(messages[0].image_png.is_some());
        assert!(messages[1..].iter().all(|m| m.image_png.is_none()));
    }

    #[test]
    fn uptime_format() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0s");
        assert_eq!(format_uptime(Duration::from_secs(65)), "1m 5s");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1d 1h 1m 1s");
        assert_eq!(format_uptime(Duration::from_secs(3600)), "1h 0m 0s");
    }

    #[tokio::test]
    async fn reading_has_text_and_image() {
        let (router, store) = router();
        let reply = router.respond(&user("tarot three Will it rain?")).await.unwrap();
        assert!(reply.text.starts_with("**Three Card Spread**"));
        assert!(reply.text.contains("Question: Will it rain?"));
        assert!(reply.text.contains("**3. Future**"));
        assert!(reply.image.is_some());

        router.drain_saves().await;
        assert_eq!(store.sheet("Readings").await.len(), 1);
    }

    #[tokio::test]
    async fn unknown_spread_is_reported_without_saving() {
        let (router, store) = router();
        let reply = router.respond(&user("tarot moon")).await.unwrap();
        assert!(reply.text.contains("no spread called `moon`"));
        assert!(reply.image.is_none());
        tokio::task::yield_now().await;
        assert_eq!(store.append_count(), 0);
    }

    #[tokio::test]
    async fn spread_keys_match_case_exactly() {
        let store = Arc::new(MemoryStore::new());
        let catalog = CardCatalog::with_contents(deck(5), vec![SpreadDefinition::new("Moon", ["Light"])]);
        let router = router_with(catalog, store.clone());

        let reply = router.respond(&user("tarot Moon rising?")).await.unwrap();
        assert!(reply.text.contains("Question: rising?"), "{}", reply.text);
        router.drain_saves().await;
        assert_eq!(store.append_count(), 1);

        let reply = router.respond(&user("tarot moon rising?")).await.unwrap();
        assert!(reply.text.contains("no spread called `moon`"));
    }

    #[tokio::test]
    async fn empty_catalog_says_loading() {
        let store = Arc::new(MemoryStore::new());
        let router = router_with(CardCatalog::new(), store.clone());
        let reply = router.respond(&user("tarot one")).await.unwrap();
        assert_eq!(reply.text, LOADING_NOTICE);
        assert_eq!(router.respond(&user("tarot spreads")).await.unwrap().text, LOADING_NOTICE);
        assert_eq!(store.append_count(), 0);
    }

    #[tokio::test]
    async fn failed_render_adds_notice() {
        let (router, _) = router();
        let reply = router.respond(&user("tarot empty")).await.unwrap();
        assert!(reply.image.is_none());
        assert!(reply.text.ends_with(RENDER_NOTICE));
    }

    #[tokio::test]
    async fn bots_and_strangers_are_ignored() {
        let (router, _) = router();
        let mut event = user("tarot one");
        event.is_bot = true;
        assert!(router.respond(&event).await.is_none());
        assert!(router.respond(&user("good morning")).await.is_none());

        let transport = CollectingTransport::new();
        router.handle(&user("good morning"), &transport).await.unwrap();
        assert!(transport.take().await.is_empty());
    }

    #[tokio::test]
    async fn help_spreads_and_status() {
        let (router, _) = router();
        let help = router.respond(&user("tarot")).await.unwrap().text;
        assert!(help.contains("`tarot spreads`"));

        let spreads = router.respond(&user("tarot spreads")).await.unwrap().text;
        assert!(spreads.contains("`three` Three Card Spread (3 cards)"));

        let status = router.respond(&user("tarot status")).await.unwrap().text;
        assert!(status.contains("Cards loaded: 22"));
        assert!(status.contains("Spreads loaded: 3"));
    }

    #[tokio::test]
    async fn history_lists_own_readings() {
        let (router, store) = router();
        store
            .set_sheet(
                "Readings",
                vec![
                    vec!["timestamp".into(), "requesterId".into()],
                    vec![
                        "2026-03-01T10:00:00Z".into(),
                        "u1".into(),
                        "Old question".into(),
                        "one".into(),
                        "Answer: Card 1 (Upright)".into(),
                    ],
                    vec![
                        "2026-03-02T10:00:00Z".into(),
                        "u2".into(),
                        "Not mine".into(),
                        "one".into(),
                        "Answer: Card 2 (Upright)".into(),
                    ],
                ],
            )
            .await;
        let text = router.respond(&user("tarot history")).await.unwrap().text;
        assert!(text.contains("1. 2026-03-01 10:00 | One Card Oracle | Old question"));
        assert!(!text.contains("Not mine"));
    }

    #[tokio::test]
    async fn store_failure_becomes_retry_notice() {
        let (router, store) = router();
        store.set_fail_reads(true);
        let reply = router.respond(&user("tarot history")).await.unwrap();
        assert_eq!(reply.text, RETRY_NOTICE);
    }
}
