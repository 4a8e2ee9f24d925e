use crate::backend::{Backend, BackendError};
use crate::record::Record;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Backend that keeps every captured record in memory.
///
/// Intended for tests and local demos: records can be inspected with
/// [`MemoryBackend::records`] or drained with [`MemoryBackend::take`].
#[derive(Default)]
pub struct MemoryBackend {
    records: Mutex<Vec<Record>>,
    flushes: AtomicU64,
    max_error_depth: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `depth` as the backend's stack depth limit.
    pub fn with_max_error_depth(depth: usize) -> Self {
        MemoryBackend {
            max_error_depth: Some(depth),
            ..Self::default()
        }
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    pub fn take(&self) -> Vec<Record> {
        std::mem::take(&mut *self.records.lock())
    }

    /// First record whose message equals `message`.
    pub fn find(&self, message: &str) -> Option<Record> {
        self.records
            .lock()
            .iter()
            .find(|r| r.message() == message)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn capture(&self, record: Record) -> Result<(), BackendError> {
        self.records.lock().push(record);
        Ok(())
    }

    async fn flush(&self, _timeout: Duration) -> bool {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        true
    }

    fn max_error_depth(&self) -> Option<usize> {
        self.max_error_depth
    }
}
