use crate::level::Level;
use chrono::{DateTime, Utc};

/// Field name under which a pre-rendered stack travels when it is not
/// attached as the record's stack trace.
pub const STACKTRACE_FIELD: &str = "stacktrace";

/// Source location of the log call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub file: String,
    pub line: u32,
}

/// One log call as produced by the host logger. Never mutated by the
/// reporting core.
#[derive(Debug, Clone)]
pub struct Entry {
    pub level: Level,
    pub message: String,
    pub time: DateTime<Utc>,
    pub logger_name: Option<String>,
    pub caller: Option<Caller>,
    /// Stack text already captured by the host logger, if any.
    pub stack: Option<String>,
}

impl Entry {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Entry {
            level,
            message: message.into(),
            time: Utc::now(),
            logger_name: None,
            caller: None,
            stack: None,
        }
    }

    pub fn logger_name(mut self, name: impl Into<String>) -> Self {
        self.logger_name = Some(name.into());
        self
    }

    pub fn caller(mut self, file: impl Into<String>, line: u32) -> Self {
        self.caller = Some(Caller {
            file: file.into(),
            line,
        });
        self
    }

    pub fn stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}
