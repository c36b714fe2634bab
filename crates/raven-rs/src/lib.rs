//! Public SDK surface for Raven.
//!
//! This crate re-exports the core building blocks, wires an orchestrator from
//! a loaded config, and hosts the line-oriented chat loop used by the binary.

/// Re-export for convenience.
pub use raven_rs_config as config;
pub use raven_rs_core as core;
/// Re-export for convenience.
pub use raven_rs_llm as llm;
/// Re-export for convenience.
pub use raven_rs_memory as memory;

mod repl;

pub use repl::{ChatLabels, run_repl};

use anyhow::Context;
use log::info;
use raven_rs_config::RavenConfig;
use raven_rs_core::Orchestrator;
use raven_rs_llm::OpenAI;
use raven_rs_memory::FileMemoryProvider;
use std::sync::Arc;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::builder()
            .format_timestamp_millis()
            .parse_default_env()
            .try_init();
    }
}

/// Build the OpenAI-compatible backend described by `config.llm`.
pub fn build_provider(config: &RavenConfig) -> anyhow::Result<OpenAI> {
    let llm = &config.llm;
    let api_key = llm.resolve_api_key().context("failed to resolve API key")?;
    info!(
        "building model provider (provider={}, base_url={}, embedding_model={}, completion_model={})",
        llm.provider, llm.base_url, llm.embedding_model, llm.completion_model
    );
    let provider = OpenAI::new(api_key)
        .with_base_url(&llm.base_url)
        .with_embedding_model(&llm.embedding_model)
        .with_completion_model(&llm.completion_model);
    match llm.timeout() {
        Some(timeout) => provider
            .with_timeout(timeout)
            .context("failed to build HTTP client"),
        None => Ok(provider),
    }
}

/// Wire an orchestrator over the file store and the configured backend.
pub fn build_orchestrator(config: &RavenConfig) -> anyhow::Result<Orchestrator> {
    let provider = build_provider(config)?;
    let memory = FileMemoryProvider::new(&config.memory.path).with_context(|| {
        format!(
            "failed to open memory log at {}",
            config.memory.path.display()
        )
    })?;
    Ok(Orchestrator::from_config(
        config,
        Arc::new(provider),
        Arc::new(memory),
    ))
}
