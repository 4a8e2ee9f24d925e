use crate::backend::{Backend, BackendError};
use crate::record::Record;
use async_trait::async_trait;
use std::io::Write;
use std::time::Duration;

/// Backend printing each record as one JSON line on stdout.
///
/// Handy for trying the layer out before a real error tracker is wired in.
#[derive(Clone, Default)]
pub struct StdoutBackend {
    pretty: bool,
}

impl StdoutBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        StdoutBackend { pretty: true }
    }
}

#[async_trait]
impl Backend for StdoutBackend {
    async fn capture(&self, record: Record) -> Result<(), BackendError> {
        let line = if self.pretty {
            serde_json::to_string_pretty(&record)
        } else {
            serde_json::to_string(&record)
        }
        .map_err(|e| BackendError::Rejected(e.to_string()))?;

        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", line).map_err(|e| BackendError::Transport(e.to_string()))
    }

    async fn flush(&self, _timeout: Duration) -> bool {
        std::io::stdout().flush().is_ok()
    }
}
