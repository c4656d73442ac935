//! Spread definitions and the known spread kinds.
//!
//! A spread's card count and slot labels always come from the spreads table.
//! [`SpreadKind`] only adds presentation: a display name and, for spreads
//! with fixed semantic roles, the role heading of each slot by index.

use serde::{Deserialize, Serialize};

/// A named template of ordered position labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadDefinition {
    /// Spread key, e.g. `"three"`.
    pub name: String,
    /// One label per slot, in draw order.
    pub position_labels: Vec<String>,
}

impl SpreadDefinition {
    /// Create a definition from a key and its labels.
    pub fn new(name: impl Into<String>, labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            position_labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a spreads-table row: key first, then labels. Blank cells are dropped.
    ///
    /// Returns `None` for a blank key or a row without labels.
    pub fn from_row(row: &[String]) -> Option<Self> {
        let (key, rest) = row.split_first()?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        let labels: Vec<String> = rest
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if labels.is_empty() {
            return None;
        }
        Some(Self {
            name: key.to_string(),
            position_labels: labels,
        })
    }

    /// Number of cards this spread draws.
    pub fn card_count(&self) -> usize {
        self.position_labels.len()
    }

    /// The presentation kind for this spread's key.
    pub fn kind(&self) -> SpreadKind {
        SpreadKind::from_key(&self.name)
    }
}

/// Spreads with built-in presentation, plus a fallback for anything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SpreadKind {
    /// Single card.
    One,
    /// Past, present, future.
    Three,
    /// Celtic cross, ten cards.
    Celt,
    /// Quick four-card spread.
    Kantan,
    /// Two-option comparison, eight cards.
    Nitaku,
    /// Horseshoe, seven cards.
    Horse,
    /// A spread defined only in the spreads table.
    Custom(String),
}

const HORSE_ROLES: &[&str] = &[
    "Past",
    "Present",
    "Near Future",
    "Advice",
    "Surroundings",
    "Obstacle",
    "Outcome",
];

const NITAKU_ROLES: &[&str] = &[
    "Current Situation",
    "Option A: Present",
    "Option A: Near Future",
    "Option A: Outcome",
    "Option B: Present",
    "Option B: Near Future",
    "Option B: Outcome",
    "Advice for the Choice",
];

const CELT_ROLES: &[&str] = &[
    "The Present",
    "The Challenge",
    "The Root",
    "The Recent Past",
    "The Crown",
    "The Near Future",
    "Yourself",
    "Your Environment",
    "Hopes and Fears",
    "The Outcome",
];

impl SpreadKind {
    /// Map a spread key to its kind. Unknown keys become [`SpreadKind::Custom`].
    pub fn from_key(key: &str) -> Self {
        match key {
            "one" => Self::One,
            "three" => Self::Three,
            "celt" => Self::Celt,
            "kantan" => Self::Kantan,
            "nitaku" => Self::Nitaku,
            "horse" => Self::Horse,
            other => Self::Custom(other.to_string()),
        }
    }

    /// The command key for this kind.
    pub fn key(&self) -> &str {
        match self {
            Self::One => "one",
            Self::Three => "three",
            Self::Celt => "celt",
            Self::Kantan => "kantan",
            Self::Nitaku => "nitaku",
            Self::Horse => "horse",
            Self::Custom(key) => key,
        }
    }

    /// Human-readable spread name. Custom spreads show their raw key.
    pub fn display_name(&self) -> &str {
        match self {
            Self::One => "One Card Oracle",
            Self::Three => "Three Card Spread",
            Self::Celt => "Celtic Cross",
            Self::Kantan => "Quick Spread",
            Self::Nitaku => "Two Choices",
            Self::Horse => "Horseshoe",
            Self::Custom(key) => key,
        }
    }

    /// Short description for the spread listing.
    pub fn description(&self) -> &str {
        match self {
            Self::One => "a single card for a quick answer",
            Self::Three => "past, present and future",
            Self::Celt => "ten cards for a deep look at one question",
            Self::Kantan => "a short look at situation, cause, advice and result",
            Self::Nitaku => "compare two options side by side",
            Self::Horse => "seven cards from past to outcome",
            Self::Custom(_) => "custom spread",
        }
    }

    /// Role headings by slot index, for spreads with fixed semantic roles.
    pub fn role_headings(&self) -> Option<&'static [&'static str]> {
        match self {
            Self::Horse => Some(HORSE_ROLES),
            Self::Nitaku => Some(NITAKU_ROLES),
            Self::Celt => Some(CELT_ROLES),
            Self::One | Self::Three | Self::Kantan | Self::Custom(_) => None,
        }
    }

    /// All kinds with built-in presentation.
    pub fn all_known() -> &'static [SpreadKind] {
        &[
            Self::One,
            Self::Three,
            Self::Kantan,
            Self::Horse,
            Self::Nitaku,
            Self::Celt,
        ]
    }
}

impl std::fmt::Display for SpreadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Display name for a spread key.
pub fn display_name(key: &str) -> String {
    SpreadKind::from_key(key).display_name().to_string()
}
