use crate::types::ChangeRecord;
use anyhow::Result;
use std::sync::Mutex;

/// Receives a record for every applied suggestion.
///
/// Delivery is best-effort: callers report a failed `log_change` and move on,
/// the edit it describes is never rolled back.
pub trait ChangeLogger {
    fn log_change(&self, record: &ChangeRecord) -> Result<()>;
}

/// Logger that drops every record
pub struct NoOpChangeLogger;

impl Default for NoOpChangeLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl NoOpChangeLogger {
    pub fn new() -> Self {
        Self
    }
}

impl ChangeLogger for NoOpChangeLogger {
    fn log_change(&self, _record: &ChangeRecord) -> Result<()> {
        Ok(()) // No-op
    }
}

/// Keeps records in memory, in the order they were logged
#[derive(Default)]
pub struct MemoryChangeLog {
    records: Mutex<Vec<ChangeRecord>>,
}

impl MemoryChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ChangeRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl ChangeLogger for MemoryChangeLog {
    fn log_change(&self, record: &ChangeRecord) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| anyhow::anyhow!("change log lock poisoned"))?
            .push(record.clone());
        Ok(())
    }
}
