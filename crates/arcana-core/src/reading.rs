//! Readings and their persisted row form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::card::DrawnCard;

/// One slot of a reading: a position label bound to a drawn card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingSlot {
    /// Position label from the spread definition.
    pub label: String,
    /// The card drawn into this position.
    pub card: DrawnCard,
}

/// A completed divination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    /// Unique reading id.
    pub id: Uuid,
    /// Key of the spread used.
    pub spread_name: String,
    /// The question as asked.
    pub question: String,
    /// Identity of the user who asked.
    pub requester_id: String,
    /// Slots in spread order.
    pub slots: Vec<ReadingSlot>,
    /// When the cards were drawn.
    pub created_at: DateTime<Utc>,
}

impl Reading {
    /// One-line summary of the drawn cards, as stored in the readings table.
    pub fn summary(&self) -> String {
        self.slots
            .iter()
            .map(|slot| {
                format!(
                    "{}: {} ({})",
                    slot.label, slot.card.card.name, slot.card.orientation
                )
            })
            .collect::<Vec<_>>()
            .join(" / ")
    }

    /// Flatten into the persisted record.
    pub fn to_record(&self) -> ReadingRecord {
        ReadingRecord {
            timestamp: self.created_at,
            requester_id: self.requester_id.clone(),
            question: self.question.clone(),
            spread_name: self.spread_name.clone(),
            result_summary: self.summary(),
        }
    }
}

/// The flat, persisted form of a reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingRecord {
    /// When the reading was performed.
    pub timestamp: DateTime<Utc>,
    /// Identity of the user who asked.
    pub requester_id: String,
    /// The question as asked.
    pub question: String,
    /// Key of the spread used.
    pub spread_name: String,
    /// Summary of the drawn cards.
    pub result_summary: String,
}

impl ReadingRecord {
    /// Row layout: `timestamp, requesterId, question, spreadName, resultSummary`.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.timestamp.to_rfc3339(),
            self.requester_id.clone(),
            self.question.clone(),
            self.spread_name.clone(),
            self.result_summary.clone(),
        ]
    }

    /// Parse a readings-table row. Rows with an unparseable timestamp are rejected.
    pub fn from_row(row: &[String]) -> Option<Self> {
        let cell = |i: usize| row.get(i).cloned().unwrap_or_default();
        let timestamp = DateTime::parse_from_rfc3339(row.first()?.trim())
            .ok()?
            .with_timezone(&Utc);
        Some(Self {
            timestamp,
            requester_id: cell(1),
            question: cell(2),
            spread_name: cell(3),
            result_summary: cell(4),
        })
    }
}
