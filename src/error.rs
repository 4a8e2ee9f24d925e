/// Error type returned when reading configuration from strings or the
/// environment.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid log level: '{0}'")]
    InvalidLevel(String),

    #[error("invalid record model: '{0}' (expected 'event' or 'log')")]
    InvalidRecordModel(String),

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// Error type returned when installing the global subscriber.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("global subscriber already set: {0}")]
    SubscriberAlreadySet(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Failure of a logger-core operation.
///
/// Part of the [`crate::core::Core`] contract; the reporting core never
/// produces it.
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("core write failed: {0}")]
    Write(String),

    #[error("core sync failed: {0}")]
    Sync(String),
}
