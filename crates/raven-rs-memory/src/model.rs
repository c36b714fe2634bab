//! Memory record model used by providers and the ranker.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Fixed speaker roles of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    /// The human side of the conversation.
    #[serde(rename = "USER")]
    User,
    /// The agent persona.
    #[serde(rename = "RAVEN", alias = "AGENT")]
    Agent,
}

impl Speaker {
    /// Tag used in persisted records, filenames, and rendered transcripts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::User => "USER",
            Speaker::Agent => "RAVEN",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display names used when records are rendered into prompt text.
///
/// Persisted tags stay fixed; only the rendered transcript changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerLabels {
    pub user: String,
    pub agent: String,
}

impl Default for SpeakerLabels {
    fn default() -> Self {
        Self::new(Speaker::User.as_str(), Speaker::Agent.as_str())
    }
}

impl SpeakerLabels {
    pub fn new(user: impl Into<String>, agent: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            agent: agent.into(),
        }
    }

    pub fn label(&self, speaker: Speaker) -> &str {
        match speaker {
            Speaker::User => &self.user,
            Speaker::Agent => &self.agent,
        }
    }
}

/// One persisted conversational turn.
///
/// Records are immutable once created: fields are only readable. Serialized
/// field order is alphabetical so files match the on-disk format exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryRecord {
    message: String,
    speaker: Speaker,
    #[serde(rename = "time")]
    timestamp: f64,
    #[serde(rename = "uuid")]
    id: Uuid,
    vector: Vec<f64>,
}

impl MemoryRecord {
    /// Create a record stamped with the current wall-clock time.
    pub fn new(speaker: Speaker, message: impl Into<String>, vector: Vec<f64>) -> Self {
        Self::at(speaker, message, vector, now_timestamp())
    }

    /// Create a record with an explicit creation time (seconds since epoch).
    pub fn at(
        speaker: Speaker,
        message: impl Into<String>,
        vector: Vec<f64>,
        timestamp: f64,
    ) -> Self {
        Self {
            message: message.into(),
            speaker,
            timestamp,
            id: Uuid::new_v4(),
            vector,
        }
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    /// Creation time in seconds since the Unix epoch.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn vector(&self) -> &[f64] {
        &self.vector
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Identifier kept for traceability only.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Render as a `SPEAKER: message` transcript line.
    pub fn render(&self) -> String {
        format!("{}: {}", self.speaker, self.message)
    }

    /// Render with display names in place of the persisted tags.
    pub fn render_as(&self, labels: &SpeakerLabels) -> String {
        format!("{}: {}", labels.label(self.speaker), self.message)
    }
}

/// A record paired with its similarity to one query vector.
///
/// Lives only for the duration of a ranking pass and is deliberately not
/// serializable.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMemory {
    pub record: MemoryRecord,
    pub score: f64,
}

impl ScoredMemory {
    pub fn into_record(self) -> MemoryRecord {
        self.record
    }
}

/// Current time as floating point seconds since the Unix epoch, microsecond resolution.
pub fn now_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
