//! Test helpers shared across Raven crates.

pub mod llm;
pub mod memory;

pub use llm::{FailingLLM, FixedLLM, FlakyLLM, hash_embedding};
pub use memory::StubMemory;
