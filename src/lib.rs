//! Forward `tracing` events to an error-tracking backend.
//!
//! A [`ReportLayer`] sits next to the other layers of a subscriber, keeps
//! error-and-above events (configurable), enriches them with span fields,
//! trace context and optional stack traces, and hands the resulting
//! records to a [`Backend`] from a background task. Logging never blocks
//! on, or fails because of, the backend.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tracing_report_sink::{init::attach, Client, CoreOptions, MemoryBackend};
//! use tracing_subscriber::Registry;
//!
//! let backend = Arc::new(MemoryBackend::new());
//! let subscriber = attach(
//!     Registry::default(),
//!     Client::new(backend.clone()),
//!     CoreOptions::default().with_stack_trace(),
//! );
//! tracing::subscriber::with_default(subscriber, || {
//!     tracing::error!(user_id = 42, "authentication failed");
//! });
//! ```

pub mod backend;
pub mod context;
pub mod core;
pub mod dispatch;
pub mod entry;
pub mod env;
pub mod error;
pub mod field;
pub mod init;
pub mod layer;
pub mod level;
pub mod memory_backend;
pub mod noop_backend;
pub mod options;
pub mod record;
pub mod stacktrace;
pub mod trace;
pub mod value;

#[cfg(feature = "stdout")]
pub mod stdout_backend;

pub use backend::{Backend, BackendError, Client, Scope};
pub use context::FieldContext;
pub use crate::core::{Core, ReportCore};
pub use dispatch::{DispatchConfig, StatsSnapshot};
pub use entry::{Caller, Entry};
pub use error::{ConfigError, CoreError, InitError};
pub use field::{Field, FieldPayload};
pub use layer::ReportLayer;
pub use level::{severity, Level, Severity};
pub use memory_backend::MemoryBackend;
pub use noop_backend::NoopBackend;
pub use options::CoreOptions;
pub use record::{Record, RecordModel};
pub use trace::{SpanId, TraceContext, TraceId};
pub use value::{coerce, AttributeValue, FieldValue};
