//! Memory provider interface and the file-per-record log.

use crate::error::MemoryError;
use crate::model::MemoryRecord;
use async_trait::async_trait;
use log::{debug, info};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

#[async_trait]
/// Append-only store of conversation records.
pub trait MemoryProvider: Send + Sync {
    /// Persist a record durably before returning.
    async fn append(&self, record: &MemoryRecord) -> Result<(), MemoryError>;

    /// Load every persisted record in no particular order.
    async fn load_all(&self) -> Result<Vec<MemoryRecord>, MemoryError>;
}

/// File-backed provider writing one pretty-printed JSON file per record.
///
/// Appends never touch existing files, so a torn write can only affect the
/// record being written. Any unreadable `.json` file fails the whole load.
#[derive(Debug, Clone)]
pub struct FileMemoryProvider {
    /// Directory holding the record files.
    root: PathBuf,
}

impl FileMemoryProvider {
    /// Create a new file-backed provider under the given root.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        info!("initialized file memory provider (root={})", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for a record. Names carry time and speaker for debugging only.
    fn record_path(&self, record: &MemoryRecord) -> PathBuf {
        self.root.join(format!(
            "log_{}_{}_{}.json",
            record.timestamp(),
            record.speaker(),
            record.id().simple()
        ))
    }

    fn read_record(path: &Path) -> Result<MemoryRecord, MemoryError> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|source| MemoryError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[async_trait]
impl MemoryProvider for FileMemoryProvider {
    async fn append(&self, record: &MemoryRecord) -> Result<(), MemoryError> {
        let path = self.record_path(record);
        let payload = serde_json::to_string_pretty(record)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        file.write_all(payload.as_bytes())?;
        file.sync_all()?;
        debug!(
            "stored memory record (speaker={}, message_len={}, path={})",
            record.speaker(),
            record.message().len(),
            path.display()
        );
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<MemoryRecord>, MemoryError> {
        let mut records = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            let is_json = path.extension().is_some_and(|ext| ext == "json");
            if !is_json || !path.is_file() {
                continue;
            }
            records.push(Self::read_record(&path)?);
        }
        debug!(
            "loaded memory records (root={}, count={})",
            self.root.display(),
            records.len()
        );
        Ok(records)
    }
}
