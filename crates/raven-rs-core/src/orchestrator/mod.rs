//! Turn orchestrator: one user input in, one reply out.

pub mod memory;
pub mod prompt;

use crate::error::RavenCoreError;
use crate::generator::Generator;
use log::{debug, info, warn};
use memory::MemorySummarizer;
use parking_lot::Mutex;
use prompt::PromptComposer;
use raven_rs_config::RavenConfig;
use raven_rs_llm::LLMProvider;
use raven_rs_memory::{
    ConversationHistory, LinearScanRanker, MemoryProvider, MemoryRanker, MemoryRecord, Speaker,
    SpeakerLabels, now_timestamp,
};
use std::sync::Arc;

/// Records recalled by similarity per turn.
pub const DEFAULT_RECALL_K: usize = 10;
/// Trailing records included verbatim in the prompt.
pub const DEFAULT_RECENT_MESSAGES: usize = 4;

/// Smallest step between two record timestamps of one orchestrator.
const TIMESTAMP_STEP: f64 = 1e-6;

/// Result payload for a single turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnResult {
    /// Reply shown to the user; may be a `"<service> error: ..."` placeholder.
    pub response: String,
    /// Notes produced from recalled memories. Empty when the turn stopped early.
    pub notes: String,
    /// Final prompt sent for the reply. Empty when the turn stopped early.
    pub prompt: String,
    /// Number of memories recalled by similarity.
    pub recalled: usize,
    /// Whether the reply was embedded and appended to the log.
    pub persisted: bool,
}

/// Drives the turn cycle over a memory store and a model backend.
///
/// Turns must not overlap: the log is reloaded from the store after the user
/// record is appended and the ranker sees exactly that snapshot.
pub struct Orchestrator {
    memory: Arc<dyn MemoryProvider>,
    ranker: Arc<dyn MemoryRanker>,
    generator: Generator,
    summarizer: MemorySummarizer,
    composer: PromptComposer,
    recall_k: usize,
    recent_messages: usize,
    last_timestamp: Mutex<f64>,
}

impl Orchestrator {
    /// Orchestrator with the linear-scan ranker and default templates.
    pub fn new(memory: Arc<dyn MemoryProvider>, generator: Generator) -> Self {
        Self {
            memory,
            ranker: Arc::new(LinearScanRanker),
            generator,
            summarizer: MemorySummarizer::default(),
            composer: PromptComposer::default(),
            recall_k: DEFAULT_RECALL_K,
            recent_messages: DEFAULT_RECENT_MESSAGES,
            last_timestamp: Mutex::new(0.0),
        }
    }

    /// Wire an orchestrator from a loaded config.
    pub fn from_config(
        config: &RavenConfig,
        provider: Arc<dyn LLMProvider>,
        memory: Arc<dyn MemoryProvider>,
    ) -> Self {
        info!(
            "initializing orchestrator (agent={}, recall_k={}, recent_messages={}, audit={})",
            config.agent_name,
            config.memory.recall_k,
            config.memory.recent_messages,
            config.audit.enabled
        );
        let labels = SpeakerLabels::new(&config.user_name, &config.agent_name);
        Self::new(memory, Generator::from_config(provider, config))
            .with_summarizer(MemorySummarizer::default().with_labels(labels))
            .with_composer(
                PromptComposer::default().with_names(&config.agent_name, &config.user_name),
            )
            .with_recall_k(config.memory.recall_k)
            .with_recent_messages(config.memory.recent_messages)
    }

    pub fn with_ranker(mut self, ranker: Arc<dyn MemoryRanker>) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn with_summarizer(mut self, summarizer: MemorySummarizer) -> Self {
        self.summarizer = summarizer;
        self
    }

    pub fn with_composer(mut self, composer: PromptComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn with_recall_k(mut self, recall_k: usize) -> Self {
        self.recall_k = recall_k;
        self
    }

    pub fn with_recent_messages(mut self, recent_messages: usize) -> Self {
        self.recent_messages = recent_messages;
        self
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    /// Run one turn.
    ///
    /// Model-call failures degrade into placeholder text; only memory store
    /// failures are returned as errors.
    pub async fn run_turn(&self, input: &str) -> Result<TurnResult, RavenCoreError> {
        debug!("turn started (input_len={})", input.len());
        let query = match self.generator.embed(input).await {
            Ok(vector) => vector,
            Err(err) => {
                warn!("input embedding failed; nothing persisted (error={err})");
                return Ok(TurnResult {
                    response: self.generator.placeholder(&err),
                    notes: String::new(),
                    prompt: String::new(),
                    recalled: 0,
                    persisted: false,
                });
            }
        };
        let user_record = MemoryRecord::at(Speaker::User, input, query, self.next_timestamp());
        self.memory.append(&user_record).await?;

        let history = ConversationHistory::load(self.memory.as_ref()).await?;
        let memories = self
            .ranker
            .rank(user_record.vector(), history.records(), self.recall_k);
        let notes = self.summarizer.summarize(&self.generator, &memories).await;
        let conversation = self
            .composer
            .render_conversation(history.recent(self.recent_messages));
        let prompt = self.composer.compose(&notes, &conversation);
        let response = self.generator.complete(&prompt).await;

        let persisted = match self.generator.embed(&response).await {
            Ok(vector) => {
                let agent_record =
                    MemoryRecord::at(Speaker::Agent, &response, vector, self.next_timestamp());
                self.memory.append(&agent_record).await?;
                true
            }
            Err(err) => {
                warn!("reply embedding failed; reply not persisted (error={err})");
                false
            }
        };
        debug!(
            "turn finished (history={}, recalled={}, response_len={}, persisted={})",
            history.len(),
            memories.len(),
            response.len(),
            persisted
        );
        Ok(TurnResult {
            response,
            notes,
            prompt,
            recalled: memories.len(),
            persisted,
        })
    }

    /// Wall-clock time, bumped past the previous record when the clock stalls.
    fn next_timestamp(&self) -> f64 {
        let mut last = self.last_timestamp.lock();
        let now = now_timestamp();
        let next = if now > *last {
            now
        } else {
            *last + TIMESTAMP_STEP
        };
        *last = next;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::Orchestrator;
    use crate::Generator;
    use pretty_assertions::assert_eq;
    use raven_rs_test_utils::{FixedLLM, StubMemory};
    use std::sync::Arc;

    #[test]
    fn timestamps_strictly_increase() {
        let orchestrator = Orchestrator::new(
            Arc::new(StubMemory::new()),
            Generator::new(Arc::new(FixedLLM::new("x"))),
        );
        let stamps = (0..100)
            .map(|_| orchestrator.next_timestamp())
            .collect::<Vec<_>>();
        assert!(stamps.windows(2).all(|pair| pair[1] > pair[0]));
    }

    #[tokio::test]
    async fn turn_persists_user_then_agent_record() {
        let memory = StubMemory::new();
        let llm = FixedLLM::new("hello back");
        let orchestrator =
            Orchestrator::new(Arc::new(memory.clone()), Generator::new(Arc::new(llm.clone())));

        let result = orchestrator.run_turn("hello").await.expect("turn");

        assert_eq!(result.response, "hello back");
        assert!(result.persisted);
        assert_eq!(result.recalled, 0);
        let records = memory.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].render(), "USER: hello");
        assert_eq!(records[1].render(), "RAVEN: hello back");
        assert!(records[1].timestamp() > records[0].timestamp());
        // notes call, then reply call
        assert_eq!(llm.prompts().len(), 2);
        assert!(result.prompt.contains("most recent messages in the conversation:\nUSER: hello\n"));
    }
}
