use crate::record::Record;
use crate::trace::{SpanId, TraceContext, TraceId};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

/// Error type reported by a [`Backend`] when it could not take a record.
///
/// The reporting core never surfaces these to the logging caller; the
/// dispatcher only counts and logs them.
#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("record rejected by backend: {0}")]
    Rejected(String),

    #[error(transparent)]
    Other(#[from] Box<dyn Error + Send + Sync>),
}

/// Remote error-tracking client that receives the records built by the
/// reporting core.
///
/// Implementations own transport, buffering and retries. `capture` is
/// called from the dispatcher's background task, never on the thread
/// that emitted the log call.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Hand one record over to the backend.
    ///
    /// **Returns**
    /// - `Ok(())` if the backend accepted the record.
    /// - `Err(..)` on transport or validation failures. The record is not
    ///   retried.
    async fn capture(&self, record: Record) -> Result<(), BackendError>;

    /// Deliver anything buffered, waiting at most `timeout`.
    ///
    /// Returns `false` when the buffer could not be drained in time.
    /// Default implementation has nothing to flush.
    async fn flush(&self, _timeout: Duration) -> bool {
        true
    }

    /// Maximum stack depth the backend wants in exception payloads, if it
    /// has an opinion.
    fn max_error_depth(&self) -> Option<usize> {
        None
    }
}

/// Explicitly injected backend handle. `Client::none()` is a valid,
/// silent client: everything sent through it is discarded.
#[derive(Clone, Default)]
pub struct Client {
    backend: Option<Arc<dyn Backend>>,
}

impl Client {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Client {
            backend: Some(backend),
        }
    }

    pub fn none() -> Self {
        Client { backend: None }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    pub fn backend(&self) -> Option<&Arc<dyn Backend>> {
        self.backend.as_ref()
    }

    pub fn max_error_depth(&self) -> Option<usize> {
        self.backend.as_ref().and_then(|b| b.max_error_depth())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl<B: Backend + 'static> From<Arc<B>> for Client {
    fn from(backend: Arc<B>) -> Self {
        Client::new(backend)
    }
}

/// Per-dispatch scope: tags and span applied to exactly one record.
///
/// Built fresh for each write so concurrent dispatches never share
/// mutable ambient state. Without a span the scope falls back to its own
/// propagation context, so every record carries trace identifiers.
#[derive(Debug, Clone)]
pub struct Scope {
    tags: BTreeMap<String, String>,
    span: Option<TraceContext>,
    propagation: TraceContext,
}

impl Scope {
    pub fn new() -> Self {
        Scope {
            tags: BTreeMap::new(),
            span: None,
            propagation: TraceContext {
                trace_id: TraceId::random(),
                span_id: SpanId::random(),
                parent_span_id: None,
                op: None,
            },
        }
    }

    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    pub fn set_span(&mut self, span: Option<TraceContext>) {
        self.span = span;
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Write the scope's tags and trace context onto `record`. Tags already
    /// present on the record win.
    pub fn apply(self, record: &mut Record) {
        let trace = self.span.unwrap_or(self.propagation);
        match record {
            Record::Event(event) => {
                for (k, v) in self.tags {
                    event.tags.entry(k).or_insert(v);
                }
                event.contexts.trace = Some(trace);
            }
            Record::Log(log) => {
                for (k, v) in self.tags {
                    log.attributes
                        .entry(k)
                        .or_insert(crate::value::AttributeValue::String(v));
                }
                log.trace = Some(trace);
            }
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}
