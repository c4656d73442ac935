//! Composes a reading into a single PNG.

use std::io::Cursor;
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbaImage};
use log::{debug, error, warn};
use tokio::task::JoinSet;

use arcana_core::Reading;
use arcana_core::spread::display_name;

use crate::artwork::ArtworkCache;
use crate::draw::{hline, palette, stroke_rect};
use crate::error::{RenderError, RenderResult};
use crate::font::{draw_text_centered, fit_text, line_height, text_width, wrap_text};
use crate::layout::{CARD_H, CARD_W, Cell, HEADER_H, PITCH_X, SIDE_MARGIN, SpreadLayout};
use crate::placeholder::fallback_tile;

/// Captions longer than this are split over two lines.
const CAPTION_SPLIT: usize = 12;
const QUESTION_LINES: usize = 4;

/// What the compositor needs for one slot.
struct SlotArt {
    label: String,
    name: String,
    glyph: char,
    reversed: bool,
    art: Arc<RgbaImage>,
}

/// Renders readings as spread images.
pub struct SpreadRenderer {
    artwork: Arc<ArtworkCache>,
}

impl SpreadRenderer {
    /// Create a renderer drawing artwork from `artwork`.
    pub fn new(artwork: Arc<ArtworkCache>) -> Self {
        Self { artwork }
    }

    /// The artwork cache in use.
    pub fn artwork(&self) -> &Arc<ArtworkCache> {
        &self.artwork
    }

    /// PNG bytes for `reading`, or `None` if the image could not be produced.
    pub async fn render(&self, reading: &Reading) -> Option<Vec<u8>> {
        let layout = SpreadLayout::compute(reading.slots.len())?;
        let slots = self.resolve_slots(reading).await;
        let title = display_name(&reading.spread_name);
        let question = reading.question.clone();
        let id = reading.id;

        match tokio::task::spawn_blocking(move || compose(&layout, &title, &question, &slots))
            .await
        {
            Ok(Ok(png)) => {
                debug!("rendered reading {id} ({} bytes)", png.len());
                Some(png)
            }
            Ok(Err(e)) => {
                error!("failed to render reading {id}: {e}");
                None
            }
            Err(e) => {
                error!("render task for reading {id} failed: {e}");
                None
            }
        }
    }

    /// Artwork for every slot, fetched concurrently.
    async fn resolve_slots(&self, reading: &Reading) -> Vec<SlotArt> {
        let mut set = JoinSet::new();
        for (i, slot) in reading.slots.iter().enumerate() {
            let cache = Arc::clone(&self.artwork);
            let card = slot.card.card.clone();
            set.spawn(async move { (i, cache.resolve(&card).await) });
        }

        let mut arts: Vec<Option<Arc<RgbaImage>>> = vec![None; reading.slots.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((i, art)) => arts[i] = Some(art),
                Err(e) => warn!("artwork task failed: {e}"),
            }
        }

        reading
            .slots
            .iter()
            .zip(arts)
            .map(|(slot, art)| SlotArt {
                label: slot.label.clone(),
                name: slot.card.card.name.clone(),
                glyph: slot.card.orientation.glyph(),
                reversed: slot.card.orientation.is_reversed(),
                art: art.unwrap_or_else(|| Arc::new(RgbaImage::new(0, 0))),
            })
            .collect()
    }
}

fn compose(
    layout: &SpreadLayout,
    title: &str,
    question: &str,
    slots: &[SlotArt],
) -> RenderResult<Vec<u8>> {
    let mut canvas = RgbaImage::from_pixel(layout.width, layout.height, palette::NIGHT);
    draw_header(&mut canvas, title, question);

    for (cell, slot) in layout.cells.iter().zip(slots) {
        let (x, y) = cell.card_origin();
        if let Err(e) = draw_card(&mut canvas, x, y, slot) {
            warn!("drawing fallback for {}: {e}", slot.name);
            fallback_tile(&mut canvas, x, y, &slot.name, slot.glyph);
        }
        draw_labels(&mut canvas, cell, slot);
    }

    let mut png = Vec::new();
    DynamicImage::ImageRgba8(canvas).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

fn draw_header(canvas: &mut RgbaImage, title: &str, question: &str) {
    let width = canvas.width();
    let cx = i64::from(width / 2);
    let inner = width.saturating_sub(SIDE_MARGIN);

    let scale = if text_width(title, 3) <= inner { 3 } else { 2 };
    let title = fit_text(title, inner, scale);
    draw_text_centered(canvas, cx, 40, &title, scale, palette::GOLD);

    if !question.is_empty() {
        let step = i64::from(line_height(2) + 8);
        let mut y = 110;
        for line in wrap_text(question, inner, 2, QUESTION_LINES) {
            draw_text_centered(canvas, cx, y, &line, 2, palette::IVORY);
            y += step;
        }
    }

    let rule_y = i64::from(HEADER_H) - 30;
    hline(
        canvas,
        i64::from(SIDE_MARGIN / 2),
        i64::from(width - SIDE_MARGIN / 2),
        rule_y,
        2,
        palette::SILVER,
    );
}

fn draw_card(canvas: &mut RgbaImage, x: i64, y: i64, slot: &SlotArt) -> RenderResult<()> {
    if slot.art.width() == 0 || slot.art.height() == 0 {
        return Err(RenderError::EmptyArtwork);
    }
    let mut face = if slot.art.dimensions() == (CARD_W, CARD_H) {
        (*slot.art).clone()
    } else {
        imageops::resize(&*slot.art, CARD_W, CARD_H, FilterType::Triangle)
    };
    if slot.reversed {
        face = imageops::rotate180(&face);
    }
    imageops::overlay(canvas, &face, x, y);
    stroke_rect(canvas, x, y, CARD_W, CARD_H, 1, palette::SILVER);
    Ok(())
}

fn draw_labels(canvas: &mut RgbaImage, cell: &Cell, slot: &SlotArt) {
    let cx = cell.center_x;
    let bottom = cell.card_bottom();
    let max = PITCH_X - 6;

    let label = fit_text(&slot.label, max, 1);
    draw_text_centered(canvas, cx, bottom + 8, &label, 1, palette::IVORY);

    let caption = format!("{} {}", slot.name, slot.glyph);
    if caption.chars().count() > CAPTION_SPLIT {
        let name = fit_text(&slot.name, max, 1);
        draw_text_centered(canvas, cx, bottom + 20, &name, 1, palette::GOLD);
        draw_text_centered(canvas, cx, bottom + 32, &slot.glyph.to_string(), 1, palette::GOLD);
    } else {
        draw_text_centered(canvas, cx, bottom + 20, &caption, 1, palette::GOLD);
    }
}

#[cfg(test)]
mod tests {
    use arcana_core::{Card, DrawnCard, Orientation, ReadingSlot};
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::artwork::NoArtwork;

    fn reading(spread: &str, n: usize) -> Reading {
        let slots = (0..n)
            .map(|i| ReadingSlot {
                label: format!("Position {}", i + 1),
                card: DrawnCard {
                    card: Card {
                        id: i as u32,
                        name: format!("Card {i}"),
                        kind: "Major".to_string(),
                        meaning: String::new(),
                        image_ref: None,
                    },
                    orientation: if i % 2 == 0 {
                        Orientation::Upright
                    } else {
                        Orientation::Reversed
                    },
                },
            })
            .collect();
        Reading {
            id: Uuid::new_v4(),
            spread_name: spread.to_string(),
            question: "Will the harvest be kind to us this year?".to_string(),
            requester_id: "u1".to_string(),
            slots,
            created_at: Utc::now(),
        }
    }

    fn renderer() -> SpreadRenderer {
        SpreadRenderer::new(Arc::new(ArtworkCache::new(Arc::new(NoArtwork))))
    }

    #[tokio::test]
    async fn renders_png_sized_to_layout() {
        let r = renderer();
        let png = r.render(&reading("horse", 7)).await.unwrap();
        let img = image::load_from_memory(&png).unwrap();
        let layout = SpreadLayout::compute(7).unwrap();
        assert_eq!((img.width(), img.height()), (layout.width, layout.height));
        assert_eq!(r.artwork().len().await, 7);
    }

    #[tokio::test]
    async fn empty_reading_renders_nothing() {
        assert!(renderer().render(&reading("one", 0)).await.is_none());
    }

    #[tokio::test]
    async fn reversed_card_is_rotated() {
        let r = renderer();
        let png = r.render(&reading("three", 2)).await.unwrap();
        let img = image::load_from_memory(&png).unwrap().to_rgba8();
        let layout = SpreadLayout::compute(2).unwrap();

        // placeholder text sits low on the card, so rotation moves it up
        let (ux, uy) = layout.cells[0].card_origin();
        let (rx, ry) = layout.cells[1].card_origin();
        let kind_row = i64::from(CARD_H) - 28;
        let row_has_text = |x: i64, y: i64| {
            (x + 10..x + i64::from(CARD_W) - 10)
                .any(|px| *img.get_pixel(px as u32, y as u32) == palette::SILVER)
        };
        assert!(row_has_text(ux, uy + kind_row));
        assert!(row_has_text(rx, ry + i64::from(CARD_H) - 1 - kind_row));
    }

    #[test]
    fn empty_artwork_falls_back_to_tile() {
        let layout = SpreadLayout::compute(1).unwrap();
        let slots = vec![SlotArt {
            label: "Now".to_string(),
            name: "The Star".to_string(),
            glyph: 'U',
            reversed: false,
            art: Arc::new(RgbaImage::new(0, 0)),
        }];
        let png = compose(&layout, "One Card Oracle", "", &slots).unwrap();
        let img = image::load_from_memory(&png).unwrap().to_rgba8();
        let (x, y) = layout.cells[0].card_origin();
        assert_eq!(*img.get_pixel(x as u32 + 5, y as u32 + 5), palette::SLATE);
    }
}
