use crate::backend::{Client, Scope};
use crate::context::FieldContext;
use crate::dispatch::{Dispatcher, StatsSnapshot};
use crate::entry::{Entry, STACKTRACE_FIELD};
use crate::error::CoreError;
use crate::field::Field;
use crate::level::{severity, Level};
use crate::options::CoreOptions;
use crate::record::{new_record_id, Contexts, Event, Exception, LogRecord, Record, RecordModel};
use crate::stacktrace::Stacktrace;
use crate::trace::TraceContext;
use crate::value::AttributeValue;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// The four operations a structured logger performs on each of its
/// destinations.
pub trait Core: Send + Sync {
    /// Whether entries at `level` are accepted at all.
    fn enabled(&self, level: Level) -> bool;

    /// Decide whether `entry` should be written. Must be cheap and free of
    /// side effects.
    fn check(&self, entry: &Entry) -> bool {
        self.enabled(entry.level)
    }

    /// New core with `fields` bound to every subsequent entry. `self` is
    /// left untouched.
    fn with(&self, fields: &[Field]) -> Self
    where
        Self: Sized;

    fn write(&self, entry: &Entry, fields: &[Field]) -> Result<(), CoreError>;

    fn sync(&self) -> Result<(), CoreError>;
}

struct Settings {
    client: Client,
    stack_trace: bool,
    fingerprint: bool,
    record_model: RecordModel,
    max_stack_depth: usize,
}

/// Core that turns accepted entries into backend records and hands them to
/// the dispatcher.
///
/// Cloning is cheap. Bound fields live in an immutable [`FieldContext`], so
/// instances derived with [`Core::with`] never observe each other's fields.
/// `write` and `sync` never fail and never wait on the backend.
#[derive(Clone)]
pub struct ReportCore {
    min_level: Level,
    context: FieldContext,
    settings: Arc<Settings>,
    dispatcher: Arc<Dispatcher>,
}

impl ReportCore {
    pub fn new(client: Client, options: CoreOptions) -> Self {
        Self::with_context(client, options, None)
    }

    /// Like [`ReportCore::new`], correlating every record with `trace`
    /// unless a field supplies another handle.
    pub fn with_context(client: Client, options: CoreOptions, trace: Option<TraceContext>) -> Self {
        let dispatcher = Dispatcher::spawn(&client, &options.dispatch);
        ReportCore {
            min_level: options.min_level,
            context: FieldContext::with_trace(trace),
            settings: Arc::new(Settings {
                client,
                stack_trace: options.stack_trace,
                fingerprint: options.fingerprint,
                record_model: options.record_model,
                max_stack_depth: options.max_stack_depth,
            }),
            dispatcher: Arc::new(dispatcher),
        }
    }

    pub fn min_level(&self) -> Level {
        self.min_level
    }

    pub fn context(&self) -> &FieldContext {
        &self.context
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.dispatcher.stats()
    }

    /// Deliver everything queued so far and stop the background worker.
    /// Shared by every core derived from the same root.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.dispatcher.shutdown(timeout).await
    }

    /// Build the backend record for `entry` under `context`, including the
    /// per-dispatch scope.
    pub fn build_record(&self, entry: &Entry, context: FieldContext) -> Record {
        let (mut fields, trace) = context.into_parts();
        let stack = self.stack_for(entry);
        if !matches!(stack, Some(StackPayload::Rendered(_))) {
            // Not used as the stack trace; keep it as caller data.
            if let Some(text) = entry.stack.as_deref().filter(|t| !t.trim().is_empty()) {
                fields
                    .entry(STACKTRACE_FIELD.to_string())
                    .or_insert_with(|| AttributeValue::String(text.to_string()));
            }
        }

        let mut scope = Scope::new();
        scope.set_span(trace);

        let mut record = match self.settings.record_model {
            RecordModel::Event => {
                if let Some(caller) = &entry.caller {
                    scope.set_tag("file", caller.file.clone());
                    scope.set_tag("line", caller.line.to_string());
                }
                Record::Event(self.build_event(entry, fields, stack))
            }
            RecordModel::Log => Record::Log(self.build_log(entry, fields, stack)),
        };

        scope.apply(&mut record);
        record
    }

    fn build_event(
        &self,
        entry: &Entry,
        extra: BTreeMap<String, AttributeValue>,
        stack: Option<StackPayload>,
    ) -> Event {
        let fingerprint = self
            .settings
            .fingerprint
            .then(|| vec![entry.message.clone()]);

        let exception = stack
            .map(|payload| payload.into_stacktrace(self.stack_depth()))
            .filter(|trace| !trace.is_empty())
            .map(|stacktrace| Exception {
                ty: "Error".to_string(),
                value: entry.message.clone(),
                stacktrace,
            })
            .into_iter()
            .collect();

        Event {
            event_id: new_record_id(),
            message: entry.message.clone(),
            level: severity(entry.level),
            timestamp: entry.time,
            platform: "rust",
            logger: entry.logger_name.clone(),
            extra,
            tags: BTreeMap::new(),
            fingerprint,
            exception,
            contexts: Contexts::default(),
        }
    }

    fn build_log(
        &self,
        entry: &Entry,
        mut attributes: BTreeMap<String, AttributeValue>,
        stack: Option<StackPayload>,
    ) -> LogRecord {
        if let Some(name) = &entry.logger_name {
            attributes
                .entry("logger".to_string())
                .or_insert_with(|| AttributeValue::String(name.clone()));
        }
        if let Some(caller) = &entry.caller {
            attributes
                .entry("code.filepath".to_string())
                .or_insert_with(|| AttributeValue::String(caller.file.clone()));
            attributes
                .entry("code.lineno".to_string())
                .or_insert(AttributeValue::Int(i64::from(caller.line)));
        }
        if let Some(payload) = stack {
            attributes.insert(
                STACKTRACE_FIELD.to_string(),
                AttributeValue::String(payload.into_text()),
            );
        }

        LogRecord {
            record_id: new_record_id(),
            body: entry.message.clone(),
            severity: severity(entry.level),
            timestamp: entry.time,
            attributes,
            trace: None,
        }
    }

    fn stack_for(&self, entry: &Entry) -> Option<StackPayload> {
        if !self.settings.stack_trace || entry.level < Level::ERROR {
            return None;
        }
        Some(match entry.stack.as_deref() {
            Some(text) if !text.trim().is_empty() => StackPayload::Rendered(text.to_string()),
            _ => StackPayload::Captured(Stacktrace::capture(self.stack_depth())),
        })
    }

    fn stack_depth(&self) -> usize {
        self.settings
            .client
            .max_error_depth()
            .unwrap_or(self.settings.max_stack_depth)
    }
}

enum StackPayload {
    /// Stack text captured by the host logger.
    Rendered(String),
    Captured(Stacktrace),
}

impl StackPayload {
    fn into_stacktrace(self, max_depth: usize) -> Stacktrace {
        match self {
            StackPayload::Rendered(text) => {
                let parsed = Stacktrace::parse(&text, max_depth);
                if parsed.is_empty() {
                    Stacktrace::capture(max_depth)
                } else {
                    parsed
                }
            }
            StackPayload::Captured(trace) => trace,
        }
    }

    fn into_text(self) -> String {
        match self {
            StackPayload::Rendered(text) => text,
            StackPayload::Captured(trace) => trace.render(),
        }
    }
}

impl Core for ReportCore {
    fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    fn with(&self, fields: &[Field]) -> Self {
        ReportCore {
            min_level: self.min_level,
            context: self.context.accumulate(fields),
            settings: Arc::clone(&self.settings),
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }

    fn write(&self, entry: &Entry, fields: &[Field]) -> Result<(), CoreError> {
        if !self.dispatcher.is_active() {
            return Ok(());
        }

        let context = self.context.accumulate(fields);
        let record = self.build_record(entry, context);
        self.dispatcher.submit(record);
        self.dispatcher.request_flush();
        Ok(())
    }

    fn sync(&self) -> Result<(), CoreError> {
        self.dispatcher.request_flush();
        Ok(())
    }
}

impl std::fmt::Debug for ReportCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportCore")
            .field("min_level", &self.min_level)
            .field("fields", &self.context.len())
            .field("client", &self.settings.client)
            .finish()
    }
}
