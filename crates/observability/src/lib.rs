//! # Observability
//!
//! Centralized logging layer for the carrier admin workspace.
//!
//! Binaries call `observability::init()` (or `init_with_config`) once at
//! startup and use the standard `tracing` macros everywhere else. Library
//! crates never install subscribers.
//!
//! Events are written as JSON lines to `~/.carrier-admin/logs/dev.jsonl`
//! (append-only, flushed per line) so that
//! `tail -f ~/.carrier-admin/logs/dev.jsonl | jq` works while the front end
//! is running. A compact stderr layer can be enabled for foreground use.
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "carrier-admin".into(),
//!     default_level: "debug".into(),
//!     also_stderr: true,
//!     ..Default::default()
//! });
//! ```

mod writer;

use std::io;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub use writer::{AppendLogWriter, WriterFactory};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, recorded on the startup line.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by the `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional custom log file path.
    /// Defaults to `~/.carrier-admin/logs/dev.jsonl`.
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Default JSONL log location shared by every service of the workspace.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".carrier-admin").join("logs").join("dev.jsonl"))
}

/// Initialize logging with default settings for the given service.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize logging with custom configuration.
///
/// Falls back to stderr-only output when the log file cannot be opened.
/// Calling this twice is harmless: the second installation is ignored.
pub fn init_with_config(config: LogConfig) {
    let log_path = config.log_path.clone().or_else(default_log_path);

    let file_layer = log_path
        .as_ref()
        .and_then(|path| match AppendLogWriter::new(path) {
            Ok(writer) => Some(writer),
            Err(e) => {
                eprintln!("failed to open log file {}: {}", path.display(), e);
                None
            }
        })
        .map(|writer| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
                .with_writer(WriterFactory::new(writer))
                .with_filter(env_filter(&config.default_level))
        });

    // Without a file there must still be somewhere to write.
    let stderr_enabled = config.also_stderr || file_layer.is_none();
    let stderr_layer = stderr_enabled.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(io::stderr)
            .with_filter(env_filter(&config.default_level))
    });

    let installed = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(
            service = %config.service_name,
            log_path = ?log_path,
            "observability initialized"
        );
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export Level for advanced filtering.
pub use tracing::Level;
