use crate::backend::{Backend, BackendError};
use crate::record::Record;
use async_trait::async_trait;

/// A backend that simply drops all records.
///
/// Useful for measuring the overhead of the reporting layer itself
/// without any external I/O.
#[derive(Clone, Default)]
pub struct NoopBackend;

#[async_trait]
impl Backend for NoopBackend {
    async fn capture(&self, _record: Record) -> Result<(), BackendError> {
        Ok(())
    }
}
