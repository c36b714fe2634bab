use async_trait::async_trait;
use parking_lot::Mutex;
use raven_rs_memory::{MemoryError, MemoryProvider, MemoryRecord};
use std::io;
use std::sync::Arc;

/// In-memory store. Clones share the same records.
#[derive(Clone, Default)]
pub struct StubMemory {
    records: Arc<Mutex<Vec<MemoryRecord>>>,
    fail_appends: bool,
    fail_loads: bool,
}

impl StubMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<MemoryRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            ..Self::default()
        }
    }

    /// Store whose appends fail with an IO error.
    pub fn failing_appends() -> Self {
        Self {
            fail_appends: true,
            ..Self::default()
        }
    }

    /// Store whose loads fail with an IO error.
    pub fn failing_loads() -> Self {
        Self {
            fail_loads: true,
            ..Self::default()
        }
    }

    /// Records in append order.
    pub fn records(&self) -> Vec<MemoryRecord> {
        self.records.lock().clone()
    }
}

#[async_trait]
impl MemoryProvider for StubMemory {
    async fn append(&self, record: &MemoryRecord) -> Result<(), MemoryError> {
        if self.fail_appends {
            return Err(MemoryError::Io(io::Error::other("stub append failure")));
        }
        self.records.lock().push(record.clone());
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<MemoryRecord>, MemoryError> {
        if self.fail_loads {
            return Err(MemoryError::Io(io::Error::other("stub load failure")));
        }
        Ok(self.records.lock().clone())
    }
}
