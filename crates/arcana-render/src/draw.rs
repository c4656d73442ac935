//! Color palette and clipped drawing primitives on an RGBA canvas.

use image::{Rgba, RgbaImage};

/// Colors used by the spread image.
pub mod palette {
    use image::Rgba;

    /// Canvas background.
    pub const NIGHT: Rgba<u8> = Rgba([29, 43, 83, 255]);
    /// Placeholder card face.
    pub const PLUM: Rgba<u8> = Rgba([126, 37, 83, 255]);
    /// Fallback tile for cards that failed to draw.
    pub const SLATE: Rgba<u8> = Rgba([95, 87, 79, 255]);
    /// Borders and the header rule.
    pub const SILVER: Rgba<u8> = Rgba([194, 195, 199, 255]);
    /// Primary text.
    pub const IVORY: Rgba<u8> = Rgba([255, 241, 232, 255]);
    /// Title and captions.
    pub const GOLD: Rgba<u8> = Rgba([255, 204, 0, 255]);
}

/// Set one pixel if it lies on the canvas.
pub fn put(img: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x < img.width() && y < img.height() {
        img.put_pixel(x, y, color);
    }
}

/// Fill an axis-aligned rectangle, clipped to the canvas.
pub fn fill_rect(img: &mut RgbaImage, x: i64, y: i64, w: u32, h: u32, color: Rgba<u8>) {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + i64::from(w)).min(i64::from(img.width()));
    let y1 = (y + i64::from(h)).min(i64::from(img.height()));
    for py in y0..y1 {
        for px in x0..x1 {
            img.put_pixel(px as u32, py as u32, color);
        }
    }
}

/// Outline a rectangle with a border of `thickness` pixels drawn inward.
pub fn stroke_rect(
    img: &mut RgbaImage,
    x: i64,
    y: i64,
    w: u32,
    h: u32,
    thickness: u32,
    color: Rgba<u8>,
) {
    let t = thickness.min(w / 2).min(h / 2).max(1);
    fill_rect(img, x, y, w, t, color);
    fill_rect(img, x, y + i64::from(h) - i64::from(t), w, t, color);
    fill_rect(img, x, y, t, h, color);
    fill_rect(img, x + i64::from(w) - i64::from(t), y, t, h, color);
}

/// Horizontal line across `[x0, x1)`.
pub fn hline(img: &mut RgbaImage, x0: i64, x1: i64, y: i64, thickness: u32, color: Rgba<u8>) {
    if x1 > x0 {
        fill_rect(img, x0, y, (x1 - x0) as u32, thickness, color);
    }
}
