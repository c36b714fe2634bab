//! Orchestrator integration tests with fake model backends.

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use raven_rs_config::RavenConfig;
use raven_rs_core::{CompletionAuditLog, Generator, MemorySummarizer, Orchestrator, RavenCoreError};
use raven_rs_llm::{
    CompletionProvider, CompletionRequest, EmbeddingProvider, LLMError, LLMProvider, RetryPolicy,
};
use raven_rs_memory::{
    FileMemoryProvider, MemoryProvider, MemoryRanker, MemoryRecord, Speaker, cosine_similarity,
};
use raven_rs_test_utils::{FailingLLM, FixedLLM, FlakyLLM, StubMemory, hash_embedding};
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

fn generator(provider: Arc<dyn LLMProvider>) -> Generator {
    Generator::new(provider).with_retry(RetryPolicy::immediate(5))
}

/// Conversation over the file store: every turn adds two records and later
/// turns recall earlier ones.
#[tokio::test]
async fn multi_turn_conversation_persists_and_recalls() {
    let temp = tempdir().expect("tempdir");
    let store = FileMemoryProvider::new(temp.path().join("chat_logs")).expect("store");
    let memory: Arc<dyn MemoryProvider> = Arc::new(store.clone());
    let llm = FixedLLM::new("Ravens are remarkable.");
    let orchestrator = Orchestrator::new(memory.clone(), generator(Arc::new(llm.clone())));

    let first = orchestrator
        .run_turn("Tell me about ravens")
        .await
        .expect("first turn");
    assert_eq!(first.response, "Ravens are remarkable.");
    assert_eq!(first.recalled, 0);

    let second = orchestrator
        .run_turn("Do ravens remember faces?")
        .await
        .expect("second turn");
    assert_eq!(second.recalled, 2);

    let records = memory.load_all().await.expect("load");
    assert_eq!(records.len(), 4);
    let files = fs::read_dir(store.root()).expect("dir").count();
    assert_eq!(files, 4);

    // second turn: notes prompt lists the first exchange oldest first
    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 4);
    assert!(prompts[2].contains("USER: Tell me about ravens\n\nRAVEN: Ravens are remarkable."));
    assert!(!prompts[2].contains("Do ravens remember faces?"));
    assert!(second.prompt.contains(
        "USER: Tell me about ravens\n\nRAVEN: Ravens are remarkable.\n\nUSER: Do ravens remember faces?"
    ));
    assert!(second.prompt.ends_with("RAVEN:"));
}

#[tokio::test]
async fn recent_messages_window_keeps_last_four() {
    let memory = StubMemory::new();
    let llm = FixedLLM::new("ok");
    let orchestrator = Orchestrator::new(Arc::new(memory.clone()), generator(Arc::new(llm)));

    for input in ["one", "two", "three"] {
        orchestrator.run_turn(input).await.expect("turn");
    }

    let result = orchestrator.run_turn("four").await.expect("turn");
    assert!(
        result
            .prompt
            .contains("conversation:\nRAVEN: ok\n\nUSER: three\n\nRAVEN: ok\n\nUSER: four\n\n")
    );
    assert!(!result.prompt.contains("USER: two"));
}

/// Every completion attempt fails: the reply is the placeholder, it is stored
/// like any other reply, and the next turn works normally.
#[tokio::test]
async fn exhausted_completion_returns_placeholder_and_loop_continues() {
    let memory = StubMemory::new();
    let llm = FlakyLLM::new(FixedLLM::new("back online")).fail_completions(10);
    let orchestrator = Orchestrator::new(Arc::new(memory.clone()), generator(Arc::new(llm.clone())));

    let failed = orchestrator.run_turn("hello?").await.expect("turn");

    assert_eq!(llm.completion_calls(), 10);
    assert!(failed.response.starts_with("Fake error: "));
    assert!(failed.response.contains("completion unavailable"));
    assert!(failed.notes.starts_with("Fake error: "));
    assert!(failed.persisted);
    let records = memory.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].speaker(), Speaker::Agent);
    assert_eq!(records[1].message(), failed.response);

    let recovered = orchestrator.run_turn("hello again").await.expect("turn");
    assert_eq!(recovered.response, "back online");
    assert_eq!(llm.completion_calls(), 12);
    assert_eq!(memory.records().len(), 4);
}

#[tokio::test]
async fn input_embedding_failure_persists_nothing() {
    let memory = StubMemory::new();
    let llm = FailingLLM::new("embeddings down");
    let orchestrator = Orchestrator::new(Arc::new(memory.clone()), generator(Arc::new(llm.clone())));

    let result = orchestrator.run_turn("anyone there?").await.expect("turn");

    assert!(result.response.starts_with("Fake error: provider error: embeddings down"));
    assert!(!result.persisted);
    assert_eq!(llm.calls(), 5);
    assert!(memory.records().is_empty());
}

/// Embeds everything except the text it was told to reject.
struct RejectingEmbedder {
    inner: FixedLLM,
    reject: String,
}

#[async_trait]
impl EmbeddingProvider for RejectingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, LLMError> {
        if text == self.reject {
            return Err(LLMError::ProviderError("rejected".to_string()));
        }
        self.inner.embed(text).await
    }
}

#[async_trait]
impl CompletionProvider for RejectingEmbedder {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LLMError> {
        self.inner.complete(request).await
    }
}

impl LLMProvider for RejectingEmbedder {
    fn name(&self) -> &str {
        "Fake"
    }
}

#[tokio::test]
async fn reply_embedding_failure_still_returns_reply() {
    let memory = StubMemory::new();
    let llm = RejectingEmbedder {
        inner: FixedLLM::new("unembeddable"),
        reject: "unembeddable".to_string(),
    };
    let orchestrator = Orchestrator::new(Arc::new(memory.clone()), generator(Arc::new(llm)));

    let result = orchestrator.run_turn("hi").await.expect("turn");

    assert_eq!(result.response, "unembeddable");
    assert!(!result.persisted);
    let records = memory.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].speaker(), Speaker::User);
}

#[tokio::test]
async fn store_failure_is_surfaced() {
    let orchestrator = Orchestrator::new(
        Arc::new(StubMemory::failing_appends()),
        generator(Arc::new(FixedLLM::new("x"))),
    );
    let err = orchestrator.run_turn("hi").await.unwrap_err();
    assert!(matches!(err, RavenCoreError::Memory(_)));

    let orchestrator = Orchestrator::new(
        Arc::new(StubMemory::failing_loads()),
        generator(Arc::new(FixedLLM::new("x"))),
    );
    assert!(orchestrator.run_turn("hi").await.is_err());
}

#[tokio::test]
async fn recall_picks_most_similar_memories_by_cosine() {
    let dims = 64;
    let seeded = ["ravens are clever birds", "the weather is sunny", "pasta recipe with garlic"]
        .iter()
        .enumerate()
        .map(|(idx, text)| {
            MemoryRecord::at(
                Speaker::User,
                *text,
                hash_embedding(text, dims),
                1_000.0 + idx as f64,
            )
        })
        .collect::<Vec<_>>();
    let memory = StubMemory::with_records(seeded.clone());
    let llm = FixedLLM::new("noted").with_dims(dims);
    let orchestrator = Orchestrator::new(Arc::new(memory), generator(Arc::new(llm.clone())))
        .with_recall_k(1)
        .with_summarizer(MemorySummarizer::new("<<INPUT>>"));

    let input = "are ravens clever";
    let result = orchestrator.run_turn(input).await.expect("turn");

    let query = hash_embedding(input, dims);
    let best = seeded
        .iter()
        .max_by(|a, b| {
            cosine_similarity(a.vector(), &query).total_cmp(&cosine_similarity(b.vector(), &query))
        })
        .expect("best");
    assert_eq!(result.recalled, 1);
    assert_eq!(llm.prompts()[0], best.render());
}

/// Ranker that always returns the oldest record.
struct OldestFirst;

impl MemoryRanker for OldestFirst {
    fn rank(&self, _query: &[f64], records: &[MemoryRecord], count: usize) -> Vec<MemoryRecord> {
        records.iter().take(count.min(1)).cloned().collect()
    }
}

#[tokio::test]
async fn custom_ranker_is_used() {
    let memory = StubMemory::with_records(vec![MemoryRecord::at(
        Speaker::Agent,
        "first ever reply",
        vec![1.0; 16],
        1.0,
    )]);
    let llm = FixedLLM::new("ok");
    let orchestrator = Orchestrator::new(Arc::new(memory), generator(Arc::new(llm.clone())))
        .with_ranker(Arc::new(OldestFirst))
        .with_summarizer(MemorySummarizer::new("<<INPUT>>"));

    orchestrator.run_turn("unrelated").await.expect("turn");

    assert_eq!(llm.prompts()[0], "RAVEN: first ever reply");
}

#[tokio::test]
async fn from_config_wires_paths_names_and_audit() {
    let temp = tempdir().expect("tempdir");
    let mut config = RavenConfig::builder().agent_name("ECHO").build();
    config.retry.backoff_ms = 0;
    config.audit.path = temp.path().join("gpt3_logs");
    let llm = FixedLLM::new("hi");
    let memory = Arc::new(FileMemoryProvider::new(temp.path().join("chat_logs")).expect("store"));

    let orchestrator = Orchestrator::from_config(&config, Arc::new(llm.clone()), memory);
    let result = orchestrator.run_turn("hello").await.expect("turn");

    assert!(result.prompt.starts_with("I am a chatbot named ECHO."));
    assert!(result.prompt.ends_with("\nECHO:"));
    assert_eq!(
        llm.requests()[1].stop,
        vec!["USER:".to_string(), "ECHO:".to_string()]
    );
    let audit = CompletionAuditLog::new(&config.audit.path);
    assert_eq!(fs::read_dir(audit.root()).expect("audit").count(), 2);
}

/// A renamed agent sees its own earlier replies under its configured name,
/// in both the recalled notes and the recent conversation.
#[tokio::test]
async fn custom_agent_name_labels_recalled_and_recent_lines() {
    let temp = tempdir().expect("tempdir");
    let mut config = RavenConfig::builder().agent_name("ECHO").build();
    config.retry.backoff_ms = 0;
    config.audit.enabled = false;
    let llm = FixedLLM::new("hi there");
    let memory = Arc::new(FileMemoryProvider::new(temp.path().join("chat_logs")).expect("store"));
    let orchestrator = Orchestrator::from_config(&config, Arc::new(llm.clone()), memory.clone());

    orchestrator.run_turn("hello").await.expect("first turn");
    let second = orchestrator.run_turn("again").await.expect("second turn");

    let notes_prompt = &llm.prompts()[2];
    assert!(notes_prompt.contains("ECHO: hi there"));
    assert!(!notes_prompt.contains("RAVEN:"));
    assert!(
        second
            .prompt
            .contains("conversation:\nUSER: hello\n\nECHO: hi there\n\nUSER: again\n\n")
    );
    assert!(!second.prompt.contains("RAVEN"));

    // persisted tags are unaffected by the display name
    let stored = memory.load_all().await.expect("load");
    let reply = stored
        .iter()
        .find(|record| record.speaker() == Speaker::Agent)
        .expect("agent record");
    assert_eq!(reply.render(), "RAVEN: hi there");
}
