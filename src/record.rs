use crate::level::Severity;
use crate::stacktrace::Stacktrace;
use crate::trace::TraceContext;
use crate::value::AttributeValue;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Which backend-native shape the reporting core builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordModel {
    /// Error-tracking event with extra data, tags, fingerprint and
    /// exception payload.
    #[default]
    Event,
    /// Structured log entry with a flat attribute map.
    Log,
}

impl std::str::FromStr for RecordModel {
    type Err = crate::error::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "event" => Ok(RecordModel::Event),
            "log" => Ok(RecordModel::Log),
            _ => Err(crate::error::ConfigError::InvalidRecordModel(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exception {
    #[serde(rename = "type")]
    pub ty: String,
    pub value: String,
    pub stacktrace: Stacktrace,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Contexts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<TraceContext>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub event_id: String,
    pub message: String,
    pub level: Severity,
    pub timestamp: DateTime<Utc>,
    pub platform: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,
    pub extra: BTreeMap<String, AttributeValue>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exception: Vec<Exception>,
    pub contexts: Contexts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub record_id: String,
    pub body: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    pub attributes: BTreeMap<String, AttributeValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<TraceContext>,
}

/// Backend-native record built fresh for every accepted entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Record {
    Event(Event),
    Log(LogRecord),
}

impl Record {
    pub fn id(&self) -> &str {
        match self {
            Record::Event(e) => &e.event_id,
            Record::Log(l) => &l.record_id,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Record::Event(e) => &e.message,
            Record::Log(l) => &l.body,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Record::Event(e) => e.level,
            Record::Log(l) => l.severity,
        }
    }

    /// Extra data of an event, attributes of a log record.
    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        match self {
            Record::Event(e) => &e.extra,
            Record::Log(l) => &l.attributes,
        }
    }

    pub fn trace(&self) -> Option<&TraceContext> {
        match self {
            Record::Event(e) => e.contexts.trace.as_ref(),
            Record::Log(l) => l.trace.as_ref(),
        }
    }

    pub fn as_event(&self) -> Option<&Event> {
        match self {
            Record::Event(e) => Some(e),
            Record::Log(_) => None,
        }
    }

    pub fn as_log(&self) -> Option<&LogRecord> {
        match self {
            Record::Log(l) => Some(l),
            Record::Event(_) => None,
        }
    }
}

/// Fresh record identifier: uuid v4 without hyphens.
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
