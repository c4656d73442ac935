//! Text rendering of readings and reading history.

use chrono::FixedOffset;

use crate::reading::{Reading, ReadingRecord};
use crate::spread::SpreadKind;

/// Message shown when a user has no recorded readings.
pub const EMPTY_HISTORY: &str = "No past readings found.";

/// Render a reading slot by slot.
///
/// Spreads with fixed semantic roles use their role headings by slot index;
/// everything else uses the labels stored with the reading.
pub fn format_reading(reading: &Reading) -> String {
    let kind = SpreadKind::from_key(&reading.spread_name);
    let roles = kind
        .role_headings()
        .filter(|roles| roles.len() == reading.slots.len());

    let mut out = format!("**{}**\n", kind.display_name());
    out.push_str(&format!("Question: {}\n", question_text(&reading.question)));

    for (i, slot) in reading.slots.iter().enumerate() {
        let heading = match roles {
            Some(roles) => roles[i],
            None => slot.label.as_str(),
        };
        let drawn = &slot.card;
        out.push('\n');
        out.push_str(&format!("**{}. {}**\n", i + 1, heading));
        out.push_str(&format!("{} ({})\n", drawn.card.name, drawn.orientation));
        if !drawn.card.meaning.is_empty() {
            out.push_str(&format!("> {}\n", drawn.card.meaning));
        }
    }

    out.trim_end().to_string()
}

/// Render reading history as a numbered list, in the order given.
///
/// Timestamps are shown in `offset`. An empty list renders [`EMPTY_HISTORY`].
pub fn format_history(records: &[ReadingRecord], offset: FixedOffset) -> String {
    if records.is_empty() {
        return EMPTY_HISTORY.to_string();
    }

    let mut out = format!("**Recent readings ({})**\n", records.len());
    for (i, record) in records.iter().enumerate() {
        let when = record.timestamp.with_timezone(&offset);
        out.push_str(&format!(
            "{}. {} | {} | {}\n",
            i + 1,
            when.format("%Y-%m-%d %H:%M"),
            SpreadKind::from_key(&record.spread_name).display_name(),
            question_text(&record.question),
        ));
    }
    out.trim_end().to_string()
}

fn question_text(question: &str) -> &str {
    let q = question.trim();
    if q.is_empty() { "(no question)" } else { q }
}
