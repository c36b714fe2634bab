//! Notes summarization over recalled memories.

use crate::generator::Generator;
use raven_rs_memory::{MemoryRecord, SpeakerLabels, render_transcript_as, sort_chronologically};

/// Instruction wrapped around the recalled transcript.
pub const NOTES_TEMPLATE: &str = "Write detailed notes of the following in a hyphenated list format like \"- \"\n\n\n\n<<INPUT>>\n\n\n\nNOTES:";

const INPUT_PLACEHOLDER: &str = "<<INPUT>>";

/// Render recalled memories oldest first into the notes prompt.
///
/// Ranker output is ordered by relevance; the transcript is re-sorted by time
/// before it is rendered.
pub fn render_notes_prompt(
    template: &str,
    memories: &[MemoryRecord],
    labels: &SpeakerLabels,
) -> String {
    let mut ordered = memories.to_vec();
    sort_chronologically(&mut ordered);
    template.replace(INPUT_PLACEHOLDER, &render_transcript_as(&ordered, labels))
}

/// Compresses recalled memories into a hyphenated note list via one completion.
///
/// Notes are rebuilt from scratch on every turn.
#[derive(Debug, Clone)]
pub struct MemorySummarizer {
    template: String,
    labels: SpeakerLabels,
}

impl Default for MemorySummarizer {
    fn default() -> Self {
        Self::new(NOTES_TEMPLATE)
    }
}

impl MemorySummarizer {
    /// `template` must contain `<<INPUT>>`.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            labels: SpeakerLabels::default(),
        }
    }

    pub fn with_labels(mut self, labels: SpeakerLabels) -> Self {
        self.labels = labels;
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn render(&self, memories: &[MemoryRecord]) -> String {
        render_notes_prompt(&self.template, memories, &self.labels)
    }

    /// One completion call, even when nothing was recalled.
    pub async fn summarize(&self, generator: &Generator, memories: &[MemoryRecord]) -> String {
        generator.complete(&self.render(memories)).await
    }
}
