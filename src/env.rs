//! Environment variable names used by this crate for convenient
//! configuration of the reporting core from services.
//!
//! These are purely helpers; the core types remain decoupled from
//! environment access.

/// Lowest level forwarded to the backend, e.g. `error` or `warn`.
pub const REPORT_SINK_MIN_LEVEL_ENV: &str = "REPORT_SINK_MIN_LEVEL";

/// `true`/`false`: attach stack traces to error-and-above records.
pub const REPORT_SINK_STACK_TRACE_ENV: &str = "REPORT_SINK_STACK_TRACE";

/// `true`/`false`: group event records by their message.
pub const REPORT_SINK_FINGERPRINT_ENV: &str = "REPORT_SINK_FINGERPRINT";

/// `event` or `log`.
pub const REPORT_SINK_RECORD_MODEL_ENV: &str = "REPORT_SINK_RECORD_MODEL";

/// Frame limit when the backend reports none.
pub const REPORT_SINK_MAX_STACK_DEPTH_ENV: &str = "REPORT_SINK_MAX_STACK_DEPTH";

/// Dispatch queue capacity.
pub const REPORT_SINK_CHANNEL_BUFFER_ENV: &str = "REPORT_SINK_CHANNEL_BUFFER";

/// Backend flush timeout in milliseconds.
pub const REPORT_SINK_FLUSH_TIMEOUT_MS_ENV: &str = "REPORT_SINK_FLUSH_TIMEOUT_MS";

/// Parse the usual spellings of a boolean flag.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bool_spellings() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" on "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
