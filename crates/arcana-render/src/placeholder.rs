//! Generated stand-ins for missing card artwork.

use image::RgbaImage;

use arcana_core::Card;

use crate::draw::{fill_rect, palette, stroke_rect};
use crate::font::{draw_text_centered, fit_text, line_height, wrap_text};
use crate::layout::{CARD_H, CARD_W};

/// Card-sized artwork showing the card's name and type.
pub fn placeholder_artwork(card: &Card) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(CARD_W, CARD_H, palette::PLUM);
    stroke_rect(&mut img, 0, 0, CARD_W, CARD_H, 3, palette::GOLD);
    stroke_rect(&mut img, 8, 8, CARD_W - 16, CARD_H - 16, 1, palette::SILVER);

    let cx = i64::from(CARD_W / 2);
    let inner = CARD_W - 24;

    let name_lines = wrap_text(&card.name, inner, 1, 4);
    let step = i64::from(line_height(1) + 5);
    let block = step * name_lines.len() as i64;
    let mut y = i64::from(CARD_H / 2) - block / 2 - 10;
    for line in &name_lines {
        draw_text_centered(&mut img, cx, y, line, 1, palette::IVORY);
        y += step;
    }

    if !card.kind.is_empty() {
        let kind = fit_text(&card.kind, inner, 1);
        draw_text_centered(&mut img, cx, i64::from(CARD_H) - 30, &kind, 1, palette::SILVER);
    }

    img
}

/// Filled tile drawn in place of a card that could not be drawn at all.
pub fn fallback_tile(img: &mut RgbaImage, x: i64, y: i64, name: &str, glyph: char) {
    fill_rect(img, x, y, CARD_W, CARD_H, palette::SLATE);
    stroke_rect(img, x, y, CARD_W, CARD_H, 2, palette::SILVER);
    let cx = x + i64::from(CARD_W / 2);
    let name = fit_text(name, CARD_W - 16, 1);
    draw_text_centered(img, cx, y + i64::from(CARD_H / 2) - 20, &name, 1, palette::IVORY);
    draw_text_centered(
        img,
        cx,
        y + i64::from(CARD_H / 2) + 5,
        &glyph.to_string(),
        3,
        palette::GOLD,
    );
}
