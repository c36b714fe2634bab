//! Error types for the core orchestrator crate.

use raven_rs_memory::MemoryError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by orchestrator operations.
///
/// Model-call failures never appear here: they are turned into a textual
/// placeholder reply by the [`Generator`](crate::Generator).
#[derive(Debug, Error)]
pub enum RavenCoreError {
    /// Memory store error.
    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Writing a completion audit file failed.
    #[error("audit log error at {path}: {source}")]
    Audit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
