//! Integration tests for the reporting layer
//!
//! These tests verify:
//! - Level gating with default and custom minimum levels
//! - Field fidelity from `tracing` events to record extras
//! - Stack trace attachment
//! - Trace context propagation from spans and marker fields
//! - Safety without a configured backend

use std::sync::Arc;
use std::time::Duration;

use tracing::subscriber::DefaultGuard;
use tracing_report_sink::{
    AttributeValue, Client, Core, CoreOptions, Entry, Field, Level, MemoryBackend, RecordModel,
    ReportCore, ReportLayer, Severity, TraceContext,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

fn install(options: CoreOptions) -> (DefaultGuard, ReportCore, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    let layer = ReportLayer::new(Client::new(backend.clone()), options);
    let core = layer.core().clone();
    let guard = tracing::subscriber::set_default(Registry::default().with(layer));
    (guard, core, backend)
}

fn unique(prefix: &str) -> String {
    format!("{} {}", prefix, uuid::Uuid::new_v4())
}

async fn drain(core: &ReportCore) {
    assert!(core.shutdown(Duration::from_secs(2)).await, "dispatcher did not drain");
}

#[tokio::test]
async fn test_without_backend_nothing_is_sent() {
    let layer = ReportLayer::new(Client::none(), CoreOptions::default().with_stack_trace());
    let core = layer.core().clone();
    let _guard = tracing::subscriber::set_default(Registry::default().with(layer));

    tracing::info!("{}", unique("info"));
    tracing::error!("{}", unique("error"));

    assert!(core.sync().is_ok());
    drain(&core).await;
    assert_eq!(core.stats().submitted, 0);
}

#[tokio::test]
async fn test_default_level_forwards_only_errors() {
    let (_guard, core, backend) = install(CoreOptions::default());
    let info = unique("info");
    let warn = unique("warn");
    let error = unique("error");

    tracing::info!("{}", info);
    tracing::warn!("{}", warn);
    tracing::error!("{}", error);
    drain(&core).await;

    assert!(backend.find(&info).is_none());
    assert!(backend.find(&warn).is_none());
    assert!(backend.find(&error).is_some());
    assert_eq!(backend.len(), 1);
}

#[tokio::test]
async fn test_min_level_info_forwards_info() {
    let (_guard, core, backend) = install(CoreOptions::default().with_min_level(Level::INFO));
    let message = unique("info");

    tracing::info!("{}", message);
    drain(&core).await;

    let record = backend.find(&message).expect("info record");
    assert_eq!(record.severity(), Severity::Info);
}

#[tokio::test]
async fn test_error_fields_reach_extra() {
    let (_guard, core, backend) = install(CoreOptions::default());
    let fake_id = uuid::Uuid::new_v4().to_string();
    let message = unique("error with fields");
    let err = std::io::Error::new(std::io::ErrorKind::Other, "error");

    tracing::error!(id = %fake_id, func = "test", error = %err, "{}", message);
    drain(&core).await;

    let record = backend.find(&message).expect("error record");
    let event = record.as_event().expect("event model");
    assert_eq!(event.extra["id"], AttributeValue::String(fake_id));
    assert_eq!(event.extra["func"], AttributeValue::String("test".into()));
    assert_eq!(event.extra["error"], AttributeValue::String("error".into()));
    assert_eq!(event.level, Severity::Error);
    assert!(!event.event_id.is_empty());
    assert!(event.exception.is_empty());
    assert!(event.contexts.trace.is_some());
    assert_eq!(event.fingerprint, Some(vec![message.clone()]));
    assert!(event.tags.contains_key("file"));
    assert!(event.tags.contains_key("line"));
}

#[tokio::test]
async fn test_stack_trace_attached_when_enabled() {
    let (_guard, core, backend) = install(CoreOptions::default().with_stack_trace());
    let message = unique("error with stack");

    tracing::error!(func = "test", "{}", message);
    drain(&core).await;

    let record = backend.find(&message).expect("error record");
    let event = record.as_event().expect("event model");
    assert_eq!(event.exception.len(), 1);
    assert_eq!(event.exception[0].value, message);
    assert!(!event.exception[0].stacktrace.frames.is_empty());
}

#[tokio::test]
async fn test_span_fields_and_trace_reach_records() {
    let (_guard, core, backend) = install(CoreOptions::default());
    let outer_message = unique("outer");
    let inner_message = unique("inner");

    let outer = tracing::info_span!("checkout", order = 7u64);
    {
        let _outer = outer.enter();
        tracing::error!("{}", outer_message);

        let inner = tracing::info_span!("charge", provider = "acme");
        let _inner = inner.enter();
        tracing::error!("{}", inner_message);
    }
    drain(&core).await;

    let outer_record = backend.find(&outer_message).expect("outer record");
    let inner_record = backend.find(&inner_message).expect("inner record");

    assert_eq!(outer_record.attributes()["order"], AttributeValue::Int(7));
    assert!(!outer_record.attributes().contains_key("span"));
    assert_eq!(inner_record.attributes()["order"], AttributeValue::Int(7));
    assert_eq!(inner_record.attributes()["provider"], AttributeValue::String("acme".into()));

    let outer_trace = outer_record.trace().expect("outer trace");
    let inner_trace = inner_record.trace().expect("inner trace");
    assert_eq!(outer_trace.op.as_deref(), Some("checkout"));
    assert_eq!(inner_trace.op.as_deref(), Some("charge"));
    assert_eq!(inner_trace.trace_id, outer_trace.trace_id);
    assert_eq!(inner_trace.parent_span_id, Some(outer_trace.span_id));
}

#[tokio::test]
async fn test_recorded_span_values_are_bound() {
    let (_guard, core, backend) = install(CoreOptions::default());
    let message = unique("after record");

    let span = tracing::info_span!("request", user = tracing::field::Empty);
    span.record("user", "bob");
    span.in_scope(|| tracing::error!("{}", message));
    drain(&core).await;

    let record = backend.find(&message).expect("record");
    assert_eq!(record.attributes()["user"], AttributeValue::String("bob".into()));
}

#[tokio::test]
async fn test_marker_field_links_trace_and_stays_out_of_extra() {
    let backend = Arc::new(MemoryBackend::new());
    let core = ReportCore::new(Client::new(backend.clone()), CoreOptions::default());
    let root = TraceContext::new_root("job_root");
    let span = root.child("job");
    let message = unique("span context");
    let err = std::io::Error::new(std::io::ErrorKind::Other, "error");

    let entry = Entry::new(Level::ERROR, message.clone());
    assert!(core.check(&entry));
    core.write(
        &entry,
        &[
            Field::string("id", "42"),
            Field::string("func", "test"),
            Field::context("ctx", span.clone()),
            Field::error(&err),
        ],
    )
    .unwrap();
    drain(&core).await;

    let record = backend.find(&message).expect("record");
    assert!(!record.attributes().contains_key("ctx"));
    assert_eq!(record.attributes()["error"], AttributeValue::String("error".into()));
    let trace = record.trace().expect("trace");
    assert_eq!(trace.span_id, span.span_id);
    assert_eq!(trace.trace_id, span.trace_id);
    assert_eq!(trace.op.as_deref(), Some("job"));
}

#[tokio::test]
async fn test_unsigned_overflow_kept_as_text() {
    let (_guard, core, backend) = install(CoreOptions::default());
    let message = unique("overflow");

    tracing::error!(big = u64::MAX, small = 5u64, "{}", message);
    drain(&core).await;

    let record = backend.find(&message).expect("record");
    assert_eq!(record.attributes()["big"], AttributeValue::String(u64::MAX.to_string()));
    assert_eq!(record.attributes()["small"], AttributeValue::Int(5));
}

#[tokio::test]
async fn test_stack_field_kept_when_stack_trace_off() {
    let (_guard, core, backend) = install(CoreOptions::default());
    let message = unique("stack field");

    tracing::error!(stacktrace = "app::a\n", "{}", message);
    drain(&core).await;

    let record = backend.find(&message).expect("record");
    let event = record.as_event().expect("event model");
    assert!(event.exception.is_empty());
    assert_eq!(event.extra["stacktrace"], AttributeValue::String("app::a\n".into()));
}

#[tokio::test]
async fn test_trace_level_reported_as_debug() {
    let (_guard, core, backend) = install(CoreOptions::default().with_min_level(Level::TRACE));
    let message = unique("just a trace");

    tracing::trace!("{}", message);
    drain(&core).await;

    let record = backend.find(&message).expect("record");
    assert_eq!(record.severity(), Severity::Debug);
}

#[tokio::test]
async fn test_log_model_carries_entry_stack() {
    let (_guard, core, backend) = install(
        CoreOptions::default()
            .with_record_model(RecordModel::Log)
            .with_stack_trace(),
    );
    let message = unique("log model");

    tracing::error!(stacktrace = "app::handler\napp::main\n", "{}", message);
    drain(&core).await;

    let record = backend.find(&message).expect("record");
    let log = record.as_log().expect("log model");
    assert_eq!(
        log.attributes["stacktrace"],
        AttributeValue::String("app::handler\napp::main\n".into())
    );
    assert!(log.attributes.contains_key("logger"));
    assert!(log.attributes.contains_key("code.lineno"));
    assert!(log.trace.is_some());
}

#[tokio::test]
async fn test_internal_diagnostics_are_not_forwarded() {
    let (_guard, core, backend) = install(CoreOptions::default());

    tracing::error!(target: "tracing_report_sink", "backend failed to capture record");
    drain(&core).await;

    assert!(backend.is_empty());
}

#[tokio::test]
async fn test_concurrent_children_stay_independent() {
    let backend = Arc::new(MemoryBackend::new());
    let parent = ReportCore::new(Client::new(backend.clone()), CoreOptions::default())
        .with(&[Field::string("service", "api")]);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let parent = parent.clone();
            std::thread::spawn(move || {
                let child = parent.with(&[Field::new(format!("worker_{}", i), i as i64)]);
                child
                    .write(&Entry::new(Level::ERROR, format!("worker {}", i)), &[])
                    .unwrap();
                child
            })
        })
        .collect();

    let children: Vec<ReportCore> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    drain(&parent).await;

    assert_eq!(backend.len(), 8);
    for (i, child) in children.iter().enumerate() {
        assert_eq!(child.context().len(), 2);
        let record = backend.find(&format!("worker {}", i)).expect("worker record");
        assert_eq!(record.attributes().len(), 2);
        assert_eq!(record.attributes()["service"], AttributeValue::String("api".into()));
        assert_eq!(
            record.attributes()[&format!("worker_{}", i)],
            AttributeValue::Int(i as i64)
        );
    }
    assert_eq!(parent.context().len(), 1);
}
