//! Logging initialization for the admin front end.
//!
//! Thin wrapper over the observability crate so binaries share one setup.

use crate::Paths;
use observability::LogConfig;

/// Initialize logging for the carrier admin CLI.
///
/// Structured JSONL goes to `<base_dir>/logs/dev.jsonl`; `RUST_LOG` wins over
/// `level`. Set `also_stderr` for foreground diagnostics.
pub fn init_logging(level: &str, paths: &Paths, also_stderr: bool) {
    observability::init_with_config(LogConfig {
        service_name: "carrier-admin".into(),
        default_level: level.into(),
        log_path: Some(paths.log_file()),
        also_stderr,
    });
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_level_all_variants() {
        assert_eq!(parse_level("trace"), tracing::Level::TRACE);
        assert_eq!(parse_level("debug"), tracing::Level::DEBUG);
        assert_eq!(parse_level("info"), tracing::Level::INFO);
        assert_eq!(parse_level("warn"), tracing::Level::WARN);
        assert_eq!(parse_level("warning"), tracing::Level::WARN);
        assert_eq!(parse_level("error"), tracing::Level::ERROR);
    }

    #[test]
    fn parse_level_case_insensitive_and_unknown() {
        assert_eq!(parse_level("DEBUG"), tracing::Level::DEBUG);
        assert_eq!(parse_level("Warning"), tracing::Level::WARN);
        assert_eq!(parse_level("verbose"), tracing::Level::INFO);
        assert_eq!(parse_level(""), tracing::Level::INFO);
    }
}
