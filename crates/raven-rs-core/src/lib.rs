//! Core turn orchestration for Raven.
//!
//! This crate wires memory recall, notes summarization, prompt composition,
//! and model calls into the single-turn cycle used by the binary and SDK.

pub mod audit;
pub mod error;
pub mod generator;
pub mod orchestrator;

pub use audit::CompletionAuditLog;
pub use error::RavenCoreError;
pub use generator::Generator;
pub use orchestrator::{
    Orchestrator, TurnResult,
    memory::{MemorySummarizer, NOTES_TEMPLATE, render_notes_prompt},
    prompt::{PromptComposer, RESPONSE_TEMPLATE},
};
