//! Cards and drawn cards.

use serde::{Deserialize, Serialize};

/// A tarot card as loaded from the cards table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Stable card identifier.
    pub id: u32,
    /// Display name, e.g. "The Fool".
    pub name: String,
    /// Card type, e.g. "Major Arcana" or "Cups".
    #[serde(rename = "type")]
    pub kind: String,
    /// Meaning text shown in readings.
    pub meaning: String,
    /// Opaque reference to external artwork, if any.
    pub image_ref: Option<String>,
}

impl Card {
    /// Parse a card from a cards-table row (`id, name, type, meaning, imageRef`).
    ///
    /// Returns `None` when the id is not an integer or the name is blank.
    pub fn from_row(row: &[String]) -> Option<Self> {
        let cell = |i: usize| row.get(i).map(|s| s.trim()).unwrap_or("");

        let id = cell(0).parse::<u32>().ok()?;
        let name = cell(1);
        if name.is_empty() {
            return None;
        }
        let image_ref = match cell(4) {
            "" => None,
            r => Some(r.to_string()),
        };

        Some(Self {
            id,
            name: name.to_string(),
            kind: cell(2).to_string(),
            meaning: cell(3).to_string(),
            image_ref,
        })
    }
}

/// Whether a drawn card faces upright or reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Card drawn the right way up.
    Upright,
    /// Card drawn upside down.
    Reversed,
}

impl Orientation {
    /// One-character glyph drawn under the card image.
    pub fn glyph(self) -> char {
        match self {
            Self::Upright => 'U',
            Self::Reversed => 'R',
        }
    }

    /// Whether this is [`Orientation::Reversed`].
    pub fn is_reversed(self) -> bool {
        matches!(self, Self::Reversed)
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upright => write!(f, "Upright"),
            Self::Reversed => write!(f, "Reversed"),
        }
    }
}

/// A card together with the orientation it was drawn in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawnCard {
    /// The card that was drawn.
    pub card: Card,
    /// Its orientation in this draw.
    pub orientation: Orientation,
}

impl DrawnCard {
    /// Card name followed by the orientation glyph, e.g. `"The Fool U"`.
    pub fn caption(&self) -> String {
        format!("{} {}", self.card.name, self.orientation.glyph())
    }
}
