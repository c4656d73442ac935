//! Card artwork: where it comes from and how long it is kept.
//!
//! Artwork is resolved once per card id and kept for the life of the process.
//! If the first attempt for a card fails, its placeholder is cached and no
//! further fetch is made for that card during the run.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::RgbaImage;
use log::{debug, warn};
use tokio::sync::RwLock;

use arcana_core::Card;

use crate::error::{RenderError, RenderResult};
use crate::placeholder::placeholder_artwork;

/// Default bound on a single artwork fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(8);

/// Fetches encoded artwork bytes by reference.
#[async_trait]
pub trait ArtworkSource: Send + Sync {
    /// Fetch the encoded image for `image_ref`.
    async fn fetch(&self, image_ref: &str) -> RenderResult<Vec<u8>>;
}

/// Fetches artwork over HTTP.
///
/// Absolute `http://` or `https://` references are fetched as-is; anything
/// else is appended to the configured base URL.
pub struct HttpArtworkSource {
    base_url: Option<String>,
    agent: ureq::Agent,
}

impl HttpArtworkSource {
    /// Create a source with an optional base URL for relative references.
    pub fn new(base_url: Option<String>) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(FETCH_TIMEOUT))
            .build()
            .into();
        Self {
            base_url: base_url.map(|b| b.trim_end_matches('/').to_string()),
            agent,
        }
    }

    /// The URL fetched for `image_ref`.
    pub fn url_for(&self, image_ref: &str) -> RenderResult<String> {
        if image_ref.starts_with("http://") || image_ref.starts_with("https://") {
            return Ok(image_ref.to_string());
        }
        match &self.base_url {
            Some(base) => Ok(format!("{base}/{}", image_ref.trim_start_matches('/'))),
            None => Err(RenderError::InvalidRef(image_ref.to_string())),
        }
    }
}

#[async_trait]
impl ArtworkSource for HttpArtworkSource {
    async fn fetch(&self, image_ref: &str) -> RenderResult<Vec<u8>> {
        let url = self.url_for(image_ref)?;
        let agent = self.agent.clone();

        // ureq is synchronous, so run it on the blocking pool
        tokio::task::spawn_blocking(move || {
            let response = agent
                .get(&url)
                .call()
                .map_err(|e| RenderError::Fetch(format!("{url}: {e}")))?;
            response
                .into_body()
                .read_to_vec()
                .map_err(|e| RenderError::Fetch(format!("{url}: {e}")))
        })
        .await
        .map_err(|e| RenderError::Fetch(format!("fetch task failed: {e}")))?
    }
}

/// Reads artwork from a local directory.
pub struct FileArtworkSource {
    root: PathBuf,
}

impl FileArtworkSource {
    /// Resolve references relative to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ArtworkSource for FileArtworkSource {
    async fn fetch(&self, image_ref: &str) -> RenderResult<Vec<u8>> {
        let rel = Path::new(image_ref);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(RenderError::InvalidRef(image_ref.to_string()));
        }
        Ok(tokio::fs::read(self.root.join(rel)).await?)
    }
}

/// A source with no artwork; every card gets a placeholder.
pub struct NoArtwork;

#[async_trait]
impl ArtworkSource for NoArtwork {
    async fn fetch(&self, image_ref: &str) -> RenderResult<Vec<u8>> {
        Err(RenderError::InvalidRef(image_ref.to_string()))
    }
}

/// Process-lifetime artwork cache keyed by card id.
pub struct ArtworkCache {
    source: Arc<dyn ArtworkSource>,
    timeout: Duration,
    entries: RwLock<HashMap<u32, Arc<RgbaImage>>>,
}

impl ArtworkCache {
    /// Create a cache over `source` with the default fetch timeout.
    pub fn new(source: Arc<dyn ArtworkSource>) -> Self {
        Self::with_timeout(source, FETCH_TIMEOUT)
    }

    /// Create a cache with a custom fetch timeout.
    pub fn with_timeout(source: Arc<dyn ArtworkSource>, timeout: Duration) -> Self {
        Self {
            source,
            timeout,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Artwork for `card`, fetching it on first use.
    ///
    /// Never fails: a missing reference, failed fetch, undecodable image or
    /// timeout all resolve to (and cache) the card's placeholder.
    pub async fn resolve(&self, card: &Card) -> Arc<RgbaImage> {
        if let Some(hit) = self.entries.read().await.get(&card.id) {
            return Arc::clone(hit);
        }

        let art = match self.load(card).await {
            Ok(img) => img,
            Err(e) => {
                warn!("artwork for card {} ({}) unavailable: {e}", card.id, card.name);
                placeholder_artwork(card)
            }
        };
        let art = Arc::new(art);
        self.entries
            .write()
            .await
            .insert(card.id, Arc::clone(&art));
        art
    }

    async fn load(&self, card: &Card) -> RenderResult<RgbaImage> {
        let Some(image_ref) = card.image_ref.as_deref() else {
            debug!("card {} has no artwork reference", card.id);
            return Ok(placeholder_artwork(card));
        };
        let bytes = tokio::time::timeout(self.timeout, self.source.fetch(image_ref))
            .await
            .map_err(|_| RenderError::Timeout(self.timeout))??;
        let img = image::load_from_memory(&bytes)?.to_rgba8();
        if img.width() == 0 || img.height() == 0 {
            return Err(RenderError::EmptyArtwork);
        }
        Ok(img)
    }

    /// Whether artwork for `card_id` is cached.
    pub async fn contains(&self, card_id: u32) -> bool {
        self.entries.read().await.contains_key(&card_id)
    }

    /// Number of cached entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use image::{DynamicImage, ImageFormat, Rgba};

    use super::*;
    use crate::draw::palette;
    use crate::layout::{CARD_H, CARD_W};

    /// Serves a fixed response and counts calls.
    struct StubSource {
        calls: AtomicUsize,
        response: Option<Vec<u8>>,
        delay: Duration,
    }

    impl StubSource {
        fn new(response: Option<Vec<u8>>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response,
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl ArtworkSource for StubSource {
        async fn fetch(&self, image_ref: &str) -> RenderResult<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.response
                .clone()
                .ok_or_else(|| RenderError::Fetch(image_ref.to_string()))
        }
    }

    fn png(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, Rgba([10, 200, 30, 255]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn card(id: u32, image_ref: Option<&str>) -> Card {
        Card {
            id,
            name: format!("Card {id}"),
            kind: "Major".to_string(),
            meaning: String::new(),
            image_ref: image_ref.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn fetched_artwork_is_cached() {
        let source = Arc::new(StubSource::new(Some(png(30, 50))));
        let cache = ArtworkCache::new(source.clone());
        let first = cache.resolve(&card(1, Some("a.png"))).await;
        let second = cache.resolve(&card(1, Some("a.png"))).await;
        assert_eq!(first.dimensions(), (30, 50));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_ref_uses_placeholder_without_fetching() {
        let source = Arc::new(StubSource::new(Some(png(30, 50))));
        let cache = ArtworkCache::new(source.clone());
        let art = cache.resolve(&card(2, None)).await;
        assert_eq!(art.dimensions(), (CARD_W, CARD_H));
        assert_eq!(*art.get_pixel(0, 0), palette::GOLD);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert!(cache.contains(2).await);
    }

    #[tokio::test]
    async fn failed_fetch_placeholder_is_sticky() {
        let source = Arc::new(StubSource::new(None));
        let cache = ArtworkCache::new(source.clone());
        let art = cache.resolve(&card(3, Some("gone.png"))).await;
        assert_eq!(art.dimensions(), (CARD_W, CARD_H));
        cache.resolve(&card(3, Some("gone.png"))).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn undecodable_bytes_use_placeholder() {
        let source = Arc::new(StubSource::new(Some(b"not an image".to_vec())));
        let cache = ArtworkCache::new(source);
        let art = cache.resolve(&card(4, Some("bad.png"))).await;
        assert_eq!(art.dimensions(), (CARD_W, CARD_H));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_times_out() {
        let mut stub = StubSource::new(Some(png(30, 50)));
        stub.delay = Duration::from_secs(30);
        let cache = ArtworkCache::new(Arc::new(stub));
        let art = cache.resolve(&card(5, Some("slow.png"))).await;
        assert_eq!(art.dimensions(), (CARD_W, CARD_H));
    }

    #[tokio::test]
    async fn file_source_reads_and_rejects_escapes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fool.png"), png(4, 4)).unwrap();
        let source = FileArtworkSource::new(dir.path());
        assert!(!source.fetch("fool.png").await.unwrap().is_empty());
        assert!(matches!(
            source.fetch("../secret.png").await,
            Err(RenderError::InvalidRef(_))
        ));
        assert!(matches!(
            source.fetch("missing.png").await,
            Err(RenderError::Io(_))
        ));
    }

    #[test]
    fn http_source_builds_urls() {
        let source = HttpArtworkSource::new(Some("https://art.example/cards/".to_string()));
        assert_eq!(
            source.url_for("fool.png").unwrap(),
            "https://art.example/cards/fool.png"
        );
        assert_eq!(
            source.url_for("http://other.example/x.png").unwrap(),
            "http://other.example/x.png"
        );
        let bare = HttpArtworkSource::new(None);
        assert!(bare.url_for("fool.png").is_err());
    }

    #[tokio::test]
    async fn no_artwork_source_always_fails() {
        assert!(NoArtwork.fetch("x").await.is_err());
    }
}
