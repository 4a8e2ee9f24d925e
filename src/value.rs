use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Payload of a structured field as handed over by the host logger.
///
/// The set of variants is closed: everything a caller can attach to an
/// entry ends up in one of these, with [`FieldValue::Debug`] as the
/// catch-all for values that only know how to render themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Bytes(Vec<u8>),
    /// Message text of an error value.
    Error(String),
    /// Text produced by a `Display` implementation.
    Display(String),
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F32(f32),
    F64(f64),
    Timestamp(DateTime<Utc>),
    Duration(Duration),
    /// Default `Debug` rendering of a value of any other type.
    Debug(String),
}

impl FieldValue {
    pub fn error(err: &(dyn std::error::Error + 'static)) -> Self {
        FieldValue::Error(err.to_string())
    }

    pub fn display(value: &dyn fmt::Display) -> Self {
        FieldValue::Display(value.to_string())
    }

    pub fn debug(value: &dyn fmt::Debug) -> Self {
        FieldValue::Debug(format!("{:?}", value))
    }
}

/// Primitive kinds understood by the remote backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            AttributeValue::String(s) => serde_json::Value::String(s.clone()),
            AttributeValue::Bool(b) => serde_json::Value::Bool(*b),
            AttributeValue::Int(i) => serde_json::Value::from(*i),
            AttributeValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(s) => write!(f, "{}", s),
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Int(i) => write!(f, "{}", i),
            AttributeValue::Float(fl) => write!(f, "{}", fl),
        }
    }
}

impl From<&AttributeValue> for serde_json::Value {
    fn from(value: &AttributeValue) -> Self {
        value.to_json_value()
    }
}

/// Convert a field payload into the backend's attribute model.
///
/// Total and deterministic. Unsigned values above `i64::MAX` are kept as
/// their decimal text instead of being wrapped.
pub fn coerce(value: &FieldValue) -> AttributeValue {
    match value {
        FieldValue::Timestamp(ts) => {
            AttributeValue::String(ts.to_rfc3339_opts(SecondsFormat::Nanos, true))
        }
        FieldValue::Duration(d) => {
            AttributeValue::String(humantime::format_duration(*d).to_string())
        }

        FieldValue::Str(s) | FieldValue::Error(s) | FieldValue::Display(s) => {
            AttributeValue::String(s.clone())
        }
        FieldValue::Bytes(b) => AttributeValue::String(String::from_utf8_lossy(b).into_owned()),

        FieldValue::Bool(b) => AttributeValue::Bool(*b),

        FieldValue::I8(i) => AttributeValue::Int(i64::from(*i)),
        FieldValue::I16(i) => AttributeValue::Int(i64::from(*i)),
        FieldValue::I32(i) => AttributeValue::Int(i64::from(*i)),
        FieldValue::I64(i) => AttributeValue::Int(*i),

        FieldValue::U8(u) => unsigned(u64::from(*u)),
        FieldValue::U16(u) => unsigned(u64::from(*u)),
        FieldValue::U32(u) => unsigned(u64::from(*u)),
        FieldValue::U64(u) => unsigned(*u),
        FieldValue::Usize(u) => unsigned(*u as u64),

        FieldValue::F32(f) => AttributeValue::Float(f64::from(*f)),
        FieldValue::F64(f) => AttributeValue::Float(*f),

        FieldValue::Debug(s) => AttributeValue::String(s.clone()),
    }
}

fn unsigned(value: u64) -> AttributeValue {
    match i64::try_from(value) {
        Ok(v) => AttributeValue::Int(v),
        Err(_) => AttributeValue::String(value.to_string()),
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(v: $ty) -> Self {
                    FieldValue::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    String => Str,
    Vec<u8> => Bytes,
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    DateTime<Utc> => Timestamp,
    Duration => Duration,
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn unsigned_above_i64_max_falls_back_to_decimal_string() {
        let big = i64::MAX as u64 + 1;
        assert_eq!(
            coerce(&FieldValue::U64(big)),
            AttributeValue::String("9223372036854775808".to_string())
        );
        assert_eq!(
            coerce(&FieldValue::U64(u64::MAX)),
            AttributeValue::String(u64::MAX.to_string())
        );
    }

    #[test]
    fn unsigned_within_range_narrows_to_int() {
        assert_eq!(coerce(&FieldValue::U64(i64::MAX as u64)), AttributeValue::Int(i64::MAX));
        assert_eq!(coerce(&FieldValue::U8(7)), AttributeValue::Int(7));
        assert_eq!(coerce(&FieldValue::Usize(42)), AttributeValue::Int(42));
    }

    #[test]
    fn signed_and_float_widths_widen() {
        assert_eq!(coerce(&FieldValue::I8(-3)), AttributeValue::Int(-3));
        assert_eq!(coerce(&FieldValue::I32(i32::MIN)), AttributeValue::Int(i32::MIN as i64));
        assert_eq!(coerce(&FieldValue::F32(1.5)), AttributeValue::Float(1.5));
        assert_eq!(coerce(&FieldValue::F64(-0.25)), AttributeValue::Float(-0.25));
    }

    #[test]
    fn temporal_values_render_as_text() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        assert_eq!(
            coerce(&FieldValue::Timestamp(ts)),
            AttributeValue::String("2024-05-06T07:08:09.000000000Z".to_string())
        );
        assert_eq!(
            coerce(&FieldValue::Duration(Duration::from_millis(1500))),
            AttributeValue::String("1s 500ms".to_string())
        );
    }

    #[test]
    fn string_like_values_become_strings() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "error");
        assert_eq!(coerce(&FieldValue::error(&err)), AttributeValue::String("error".into()));
        assert_eq!(coerce(&FieldValue::Bytes(b"raw".to_vec())), AttributeValue::String("raw".into()));
        assert_eq!(coerce(&FieldValue::display(&42)), AttributeValue::String("42".into()));
        assert_eq!(coerce(&FieldValue::from(true)), AttributeValue::Bool(true));
    }

    #[test]
    fn unknown_types_use_debug_rendering() {
        #[derive(Debug)]
        struct Point {
            x: i32,
        }
        assert_eq!(
            coerce(&FieldValue::debug(&Point { x: 1 })),
            AttributeValue::String("Point { x: 1 }".into())
        );
    }

    #[test]
    fn attribute_values_serialize_untagged() {
        let json = serde_json::to_string(&vec![
            AttributeValue::String("a".into()),
            AttributeValue::Int(1),
            AttributeValue::Bool(false),
        ])
        .unwrap();
        assert_eq!(json, r#"["a",1,false]"#);
    }
}
