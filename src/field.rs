use crate::trace::TraceContext;
use crate::value::FieldValue;

/// What a field carries.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPayload {
    Value(FieldValue),
    /// Reserved marker: the field smuggles a trace handle and is never
    /// treated as display data.
    Context(TraceContext),
    /// Contributes nothing.
    Skip,
}

/// A named, typed piece of structured data attached to an entry or bound
/// ahead of time with `with`.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub payload: FieldPayload,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Field {
            name: name.into(),
            payload: FieldPayload::Value(value.into()),
        }
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Field::new(name, FieldValue::Str(value.into()))
    }

    /// Field named `error` holding the error's message.
    pub fn error(err: &(dyn std::error::Error + 'static)) -> Self {
        Field {
            name: "error".to_string(),
            payload: FieldPayload::Value(FieldValue::error(err)),
        }
    }

    pub fn context(name: impl Into<String>, trace: TraceContext) -> Self {
        Field {
            name: name.into(),
            payload: FieldPayload::Context(trace),
        }
    }

    pub fn skip(name: impl Into<String>) -> Self {
        Field {
            name: name.into(),
            payload: FieldPayload::Skip,
        }
    }
}
