//! Chronological view over the persisted log.

use crate::error::MemoryError;
use crate::model::{MemoryRecord, SpeakerLabels};
use crate::provider::MemoryProvider;
use std::cmp::Ordering;

/// All records of a session sorted by creation time.
///
/// Built fresh from the provider on every turn and dropped afterwards; there is
/// no cached copy across turns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationHistory {
    records: Vec<MemoryRecord>,
}

impl ConversationHistory {
    /// Reload every persisted record and sort it chronologically.
    pub async fn load(provider: &dyn MemoryProvider) -> Result<Self, MemoryError> {
        let records = provider.load_all().await?;
        Ok(Self::from_records(records))
    }

    pub fn from_records(mut records: Vec<MemoryRecord>) -> Self {
        sort_chronologically(&mut records);
        Self { records }
    }

    pub fn records(&self) -> &[MemoryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Trailing `limit` records in chronological order.
    pub fn recent(&self, limit: usize) -> &[MemoryRecord] {
        recent_messages(&self.records, limit)
    }
}

/// Stable sort by timestamp, oldest first.
pub fn sort_chronologically(records: &mut [MemoryRecord]) {
    records.sort_by(|a, b| {
        a.timestamp()
            .partial_cmp(&b.timestamp())
            .unwrap_or(Ordering::Equal)
    });
}

/// Last `limit` entries of a chronologically sorted slice, or all of them when shorter.
pub fn recent_messages(records: &[MemoryRecord], limit: usize) -> &[MemoryRecord] {
    let start = records.len().saturating_sub(limit);
    &records[start..]
}

/// Render records as `SPEAKER: message` blocks separated by a blank line.
pub fn render_transcript<'a>(records: impl IntoIterator<Item = &'a MemoryRecord>) -> String {
    render_transcript_as(records, &SpeakerLabels::default())
}

/// Same as [`render_transcript`] with display names for each speaker.
pub fn render_transcript_as<'a>(
    records: impl IntoIterator<Item = &'a MemoryRecord>,
    labels: &SpeakerLabels,
) -> String {
    records
        .into_iter()
        .map(|record| record.render_as(labels))
        .collect::<Vec<_>>()
        .join("\n\n")
        .trim()
        .to_string()
}
