//! Long-term conversational memory for Raven.
//!
//! Every turn is stored as an immutable [`MemoryRecord`] carrying its
//! embedding. Recall re-reads the full log and ranks it by cosine similarity
//! against the current query vector.

pub mod error;
pub mod history;
pub mod model;
pub mod provider;
pub mod recall;

/// Memory error type.
pub use error::MemoryError;
/// Chronological history helpers.
pub use history::{
    ConversationHistory, recent_messages, render_transcript, render_transcript_as,
    sort_chronologically,
};
/// Memory record model.
pub use model::{MemoryRecord, ScoredMemory, Speaker, SpeakerLabels, now_timestamp};
/// Memory provider interface and default file implementation.
pub use provider::{FileMemoryProvider, MemoryProvider};
/// Similarity ranking.
pub use recall::{LinearScanRanker, MemoryRanker, cosine_similarity, fetch_memories, score_memories};
