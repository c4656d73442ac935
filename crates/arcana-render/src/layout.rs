//! Grid layout of a spread image.
//!
//! Cards sit in fixed-size cells that wrap after five columns. The canvas is
//! sized to its content, and every row is centered on its own card count, so
//! a short last row sits in the middle rather than flush left.

/// Card box width.
pub const CARD_W: u32 = 120;
/// Card box height.
pub const CARD_H: u32 = 200;
/// Horizontal distance between card centers.
pub const PITCH_X: u32 = 140;
/// Vertical distance between card centers.
pub const PITCH_Y: u32 = 280;
/// Cards per row before wrapping.
pub const MAX_COLUMNS: usize = 5;
/// Left and right canvas margin.
pub const SIDE_MARGIN: u32 = 70;
/// Height of the title and question band above the grid.
pub const HEADER_H: u32 = 300;
/// Space below the last row for its labels.
pub const FOOTER_H: u32 = 60;

/// Where one card goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Zero-based row.
    pub row: usize,
    /// Zero-based position within the row.
    pub col: usize,
    /// Card center, x.
    pub center_x: i64,
    /// Card center, y.
    pub center_y: i64,
}

impl Cell {
    /// Top-left corner of the card box.
    pub fn card_origin(&self) -> (i64, i64) {
        (
            self.center_x - i64::from(CARD_W / 2),
            self.center_y - i64::from(CARD_H / 2),
        )
    }

    /// Y coordinate of the bottom edge of the card box.
    pub fn card_bottom(&self) -> i64 {
        self.center_y + i64::from(CARD_H / 2)
    }
}

/// Canvas size and card cells for a spread of a given size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadLayout {
    /// Canvas width.
    pub width: u32,
    /// Canvas height.
    pub height: u32,
    /// Number of rows.
    pub rows: usize,
    /// Number of columns in the widest row.
    pub columns: usize,
    /// One cell per card, in slot order.
    pub cells: Vec<Cell>,
}

impl SpreadLayout {
    /// Lay out `card_count` cards. Returns `None` for an empty spread.
    pub fn compute(card_count: usize) -> Option<Self> {
        if card_count == 0 {
            return None;
        }

        let rows = card_count.div_ceil(MAX_COLUMNS);
        let columns = card_count.min(MAX_COLUMNS);
        let width = 2 * SIDE_MARGIN + columns as u32 * PITCH_X;
        let height = HEADER_H + ((rows as u32 - 1) * PITCH_Y + CARD_H) + FOOTER_H;

        let mut cells = Vec::with_capacity(card_count);
        for row in 0..rows {
            let in_row = (card_count - row * MAX_COLUMNS).min(MAX_COLUMNS);
            let row_span = in_row as u32 * PITCH_X;
            let first_x = i64::from((width - row_span) / 2 + PITCH_X / 2);
            let center_y = i64::from(HEADER_H + row as u32 * PITCH_Y + CARD_H / 2);
            for col in 0..in_row {
                cells.push(Cell {
                    row,
                    col,
                    center_x: first_x + col as i64 * i64::from(PITCH_X),
                    center_y,
                });
            }
        }

        Some(Self {
            width,
            height,
            rows,
            columns,
            cells,
        })
    }

    /// Cells of one row.
    pub fn row(&self, row: usize) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(move |c| c.row == row)
    }
}
