use crate::backend::Client;
use crate::core::{Core, ReportCore};
use crate::dispatch::INTERNAL_TARGET;
use crate::entry::{Caller, Entry, STACKTRACE_FIELD};
use crate::field::Field;
use crate::level::Level;
use crate::options::CoreOptions;
use crate::trace::TraceContext;
use crate::value::FieldValue;
use chrono::Utc;
use tracing::field::{Field as TracingField, Visit};
use tracing::span::{Attributes, Id, Record as SpanValues};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::{LookupSpan, SpanRef};

/// `tracing_subscriber` layer that forwards accepted events to a
/// [`ReportCore`].
///
/// Every span gets its own core derived from its parent's with the span's
/// fields and a child trace context bound to it, so events carry the
/// fields and trace of the span they were emitted in. Events below the
/// configured level cost one comparison.
pub struct ReportLayer {
    root: ReportCore,
}

/// Per-span core stored in the registry's span extensions.
struct SpanCore(ReportCore);

impl ReportLayer {
    pub fn new(client: Client, options: CoreOptions) -> Self {
        Self::from_core(ReportCore::new(client, options))
    }

    pub fn from_core(root: ReportCore) -> Self {
        ReportLayer { root }
    }

    /// Root core, shared with everything this layer derives.
    pub fn core(&self) -> &ReportCore {
        &self.root
    }

    fn core_for<S>(&self, event: &Event<'_>, ctx: &Context<'_, S>) -> ReportCore
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        ctx.event_span(event)
            .and_then(|span| span_core(&span))
            .unwrap_or_else(|| self.root.clone())
    }
}

fn span_core<'a, R>(span: &SpanRef<'a, R>) -> Option<ReportCore>
where
    R: LookupSpan<'a>,
{
    let extensions = span.extensions();
    extensions.get::<SpanCore>().map(|c| c.0.clone())
}

fn is_internal(target: &str) -> bool {
    target == INTERNAL_TARGET
        || target
            .strip_prefix(INTERNAL_TARGET)
            .map_or(false, |rest| rest.starts_with("::"))
}

impl<S> Layer<S> for ReportLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let parent = span
            .parent()
            .and_then(|p| span_core(&p))
            .unwrap_or_else(|| self.root.clone());

        let name = attrs.metadata().name();
        let trace = match parent.context().trace() {
            Some(parent_trace) => parent_trace.child(name),
            None => TraceContext::new_root(name),
        };

        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);
        let mut fields = visitor.into_span_fields();
        fields.push(Field::context("span", trace));

        let core = parent.with(&fields);
        span.extensions_mut().insert(SpanCore(core));
    }

    fn on_record(&self, id: &Id, values: &SpanValues<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut visitor = FieldVisitor::default();
        values.record(&mut visitor);
        let fields = visitor.into_span_fields();

        let mut extensions = span.extensions_mut();
        if let Some(SpanCore(core)) = extensions.get_mut::<SpanCore>() {
            *core = core.with(&fields);
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let meta = event.metadata();
        if is_internal(meta.target()) {
            return;
        }

        let level = Level::from(*meta.level());
        if !self.root.enabled(level) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let entry = Entry {
            level,
            message: visitor.message.take().unwrap_or_default(),
            time: Utc::now(),
            logger_name: Some(meta.target().to_string()),
            caller: match (meta.file(), meta.line()) {
                (Some(file), Some(line)) => Some(Caller {
                    file: file.to_string(),
                    line,
                }),
                _ => None,
            },
            stack: visitor.stack.take(),
        };

        let core = self.core_for(event, &ctx);
        if core.check(&entry) {
            // Reporting never fails the log call.
            let _ = core.write(&entry, &visitor.fields);
        }
    }
}

/// Collects `tracing` field values as [`Field`]s, pulling out the message
/// and any pre-rendered stack.
#[derive(Default)]
pub struct FieldVisitor {
    pub fields: Vec<Field>,
    pub message: Option<String>,
    pub stack: Option<String>,
}

impl FieldVisitor {
    /// Fields of a span; a `message` field is kept as ordinary data.
    fn into_span_fields(self) -> Vec<Field> {
        let mut fields = self.fields;
        if let Some(message) = self.message {
            fields.push(Field::string("message", message));
        }
        if let Some(stack) = self.stack {
            fields.push(Field::string(STACKTRACE_FIELD, stack));
        }
        fields
    }

    fn push(&mut self, field: &TracingField, value: FieldValue) {
        self.fields.push(Field::new(field.name(), value));
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &TracingField, value: &str) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            STACKTRACE_FIELD => self.stack = Some(value.to_string()),
            _ => self.push(field, FieldValue::Str(value.to_string())),
        }
    }

    fn record_i64(&mut self, field: &TracingField, value: i64) {
        self.push(field, FieldValue::I64(value));
    }

    fn record_u64(&mut self, field: &TracingField, value: u64) {
        self.push(field, FieldValue::U64(value));
    }

    fn record_i128(&mut self, field: &TracingField, value: i128) {
        let value = i64::try_from(value)
            .map(FieldValue::I64)
            .unwrap_or_else(|_| FieldValue::display(&value));
        self.push(field, value);
    }

    fn record_u128(&mut self, field: &TracingField, value: u128) {
        let value = u64::try_from(value)
            .map(FieldValue::U64)
            .unwrap_or_else(|_| FieldValue::display(&value));
        self.push(field, value);
    }

    fn record_f64(&mut self, field: &TracingField, value: f64) {
        self.push(field, FieldValue::F64(value));
    }

    fn record_bool(&mut self, field: &TracingField, value: bool) {
        self.push(field, FieldValue::Bool(value));
    }

    fn record_error(&mut self, field: &TracingField, value: &(dyn std::error::Error + 'static)) {
        self.push(field, FieldValue::error(value));
    }

    fn record_debug(&mut self, field: &TracingField, value: &dyn std::fmt::Debug) {
        match field.name() {
            "message" => self.message = Some(format!("{:?}", value)),
            STACKTRACE_FIELD => self.stack = Some(format!("{:?}", value)),
            _ => self.push(field, FieldValue::debug(value)),
        }
    }
}
