use crate::field::{Field, FieldPayload};
use crate::trace::TraceContext;
use crate::value::{coerce, AttributeValue};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Immutable set of accumulated fields plus the optional trace handle.
///
/// Every accumulation yields a new, independent value; clones share the
/// underlying map read-only.
#[derive(Debug, Clone, Default)]
pub struct FieldContext {
    fields: Arc<BTreeMap<String, AttributeValue>>,
    trace: Option<TraceContext>,
}

impl FieldContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trace(trace: Option<TraceContext>) -> Self {
        FieldContext {
            fields: Arc::new(BTreeMap::new()),
            trace,
        }
    }

    pub fn fields(&self) -> &BTreeMap<String, AttributeValue> {
        &self.fields
    }

    pub fn trace(&self) -> Option<&TraceContext> {
        self.trace.as_ref()
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Layer `fields` on top of this context.
    ///
    /// Later fields overwrite earlier ones with the same name. The last
    /// trace carrier in `fields` replaces the inherited handle; without one
    /// the inherited handle is kept.
    pub fn accumulate(&self, fields: &[Field]) -> FieldContext {
        if fields.is_empty() {
            return self.clone();
        }

        let mut map = BTreeMap::clone(&self.fields);
        let mut trace = self.trace.clone();

        for field in fields {
            match &field.payload {
                FieldPayload::Context(ctx) => trace = Some(ctx.clone()),
                FieldPayload::Value(value) => {
                    map.insert(field.name.clone(), coerce(value));
                }
                FieldPayload::Skip => {}
            }
        }

        FieldContext {
            fields: Arc::new(map),
            trace,
        }
    }

    pub fn into_parts(self) -> (BTreeMap<String, AttributeValue>, Option<TraceContext>) {
        let fields = Arc::try_unwrap(self.fields).unwrap_or_else(|shared| (*shared).clone());
        (fields, self.trace)
    }
}
