use serde::Serialize;
use std::backtrace::Backtrace;

/// Frame count used when the backend does not report its own limit.
pub const DEFAULT_MAX_STACK_DEPTH: usize = 50;

/// Frames belonging to this crate, the backtrace machinery and the
/// tracing dispatch plumbing are not interesting to readers of a report.
const SKIPPED_PREFIXES: &[&str] = &[
    "std::backtrace",
    "tracing_report_sink::",
    "tracing_core::",
    "tracing_subscriber::",
    "tracing::",
    "<tracing_subscriber::",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub function: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct Stacktrace {
    pub frames: Vec<Frame>,
}

impl Stacktrace {
    /// Capture the current thread's stack, keeping at most `max_depth`
    /// frames.
    pub fn capture(max_depth: usize) -> Self {
        let backtrace = Backtrace::force_capture();
        let mut trace = Self::parse(&backtrace.to_string(), max_depth);
        if trace.frames.is_empty() && max_depth > 0 {
            // Symbols unavailable; keep something the reader can act on.
            trace.frames.push(Frame {
                function: "<unknown>".to_string(),
                location: None,
            });
        }
        trace
    }

    /// Parse a rendered backtrace in the `std` format:
    ///
    /// ```text
    ///    0: crate::module::function
    ///              at ./src/module.rs:10:5
    /// ```
    ///
    /// Lines that do not follow it are kept as bare function names, so any
    /// pre-rendered stack text yields frames.
    pub fn parse(text: &str, max_depth: usize) -> Self {
        let mut frames: Vec<Frame> = Vec::new();

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(location) = trimmed.strip_prefix("at ") {
                if let Some(last) = frames.last_mut() {
                    if last.location.is_none() {
                        last.location = Some(location.to_string());
                    }
                }
                continue;
            }

            let function = match trimmed.split_once(": ") {
                Some((index, rest)) if index.chars().all(|c| c.is_ascii_digit()) => rest,
                _ => trimmed,
            };
            frames.push(Frame {
                function: function.to_string(),
                location: None,
            });
        }

        frames.retain(|f| !SKIPPED_PREFIXES.iter().any(|p| f.function.starts_with(p)));
        frames.truncate(max_depth);
        Stacktrace { frames }
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Plain-text rendering, one frame per line with its location indented
    /// below it.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for frame in &self.frames {
            out.push_str(&frame.function);
            out.push('\n');
            if let Some(location) = &frame.location {
                out.push_str("\tat ");
                out.push_str(location);
                out.push('\n');
            }
        }
        out
    }
}
