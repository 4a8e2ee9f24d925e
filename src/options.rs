use crate::dispatch::DispatchConfig;
use crate::env::{
    parse_bool, REPORT_SINK_CHANNEL_BUFFER_ENV, REPORT_SINK_FINGERPRINT_ENV,
    REPORT_SINK_FLUSH_TIMEOUT_MS_ENV, REPORT_SINK_MAX_STACK_DEPTH_ENV,
    REPORT_SINK_MIN_LEVEL_ENV, REPORT_SINK_RECORD_MODEL_ENV, REPORT_SINK_STACK_TRACE_ENV,
};
use crate::error::ConfigError;
use crate::level::Level;
use crate::record::RecordModel;
use crate::stacktrace::DEFAULT_MAX_STACK_DEPTH;
use std::time::Duration;

/// Construction-time configuration of a [`crate::core::ReportCore`].
///
/// **Fields**
/// - `min_level`: lowest level forwarded. Defaults to `ERROR`.
/// - `stack_trace`: attach a stack trace to error-and-above records.
///   Off by default.
/// - `fingerprint`: group event records by message text. On by default;
///   ignored for [`RecordModel::Log`].
/// - `record_model`: shape of the records handed to the backend.
/// - `max_stack_depth`: frame limit used when the backend reports none.
/// - `dispatch`: queue and flush settings.
#[derive(Clone, Debug)]
pub struct CoreOptions {
    pub min_level: Level,
    pub stack_trace: bool,
    pub fingerprint: bool,
    pub record_model: RecordModel,
    pub max_stack_depth: usize,
    pub dispatch: DispatchConfig,
}

impl Default for CoreOptions {
    fn default() -> Self {
        Self {
            min_level: Level::ERROR,
            stack_trace: false,
            fingerprint: true,
            record_model: RecordModel::Event,
            max_stack_depth: DEFAULT_MAX_STACK_DEPTH,
            dispatch: DispatchConfig::default(),
        }
    }
}

impl CoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_level(mut self, level: impl Into<Level>) -> Self {
        self.min_level = level.into();
        self
    }

    pub fn with_stack_trace(mut self) -> Self {
        self.stack_trace = true;
        self
    }

    pub fn with_fingerprint(mut self, enabled: bool) -> Self {
        self.fingerprint = enabled;
        self
    }

    pub fn with_record_model(mut self, model: RecordModel) -> Self {
        self.record_model = model;
        self
    }

    pub fn with_max_stack_depth(mut self, depth: usize) -> Self {
        self.max_stack_depth = depth;
        self
    }

    pub fn with_dispatch(mut self, dispatch: DispatchConfig) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Defaults overridden by the `REPORT_SINK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`CoreOptions::from_env`] but reading values from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();

        if let Some(v) = lookup(REPORT_SINK_MIN_LEVEL_ENV) {
            options.min_level = v.parse()?;
        }
        if let Some(v) = lookup(REPORT_SINK_STACK_TRACE_ENV) {
            options.stack_trace = flag(REPORT_SINK_STACK_TRACE_ENV, &v)?;
        }
        if let Some(v) = lookup(REPORT_SINK_FINGERPRINT_ENV) {
            options.fingerprint = flag(REPORT_SINK_FINGERPRINT_ENV, &v)?;
        }
        if let Some(v) = lookup(REPORT_SINK_RECORD_MODEL_ENV) {
            options.record_model = v.parse()?;
        }
        if let Some(v) = lookup(REPORT_SINK_MAX_STACK_DEPTH_ENV) {
            options.max_stack_depth = number(REPORT_SINK_MAX_STACK_DEPTH_ENV, &v)?;
        }
        if let Some(v) = lookup(REPORT_SINK_CHANNEL_BUFFER_ENV) {
            options.dispatch.channel_buffer = number(REPORT_SINK_CHANNEL_BUFFER_ENV, &v)?;
        }
        if let Some(v) = lookup(REPORT_SINK_FLUSH_TIMEOUT_MS_ENV) {
            let ms = number(REPORT_SINK_FLUSH_TIMEOUT_MS_ENV, &v)?;
            options.dispatch.flush_timeout = Duration::from_millis(ms as u64);
        }

        Ok(options)
    }
}

fn flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn number(key: &'static str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}
