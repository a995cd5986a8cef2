//! `[logging]` and the process-wide `tracing` subscriber.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "warn";
const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// A level (`info`, `debug`, ...) or a full `EnvFilter` directive string.
    #[serde(default = "default_level")]
    pub level: String,
    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json: bool,
    /// Append logs to this file instead of writing them to stderr.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_level() -> String {
    DEFAULT_LEVEL.to_owned()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
            file: None,
        }
    }
}

/// Directive string for a configured level. Bare level names are case-insensitive and `warning`
/// means `warn`; anything else is passed through as a directive string.
pub(crate) fn level_directives(level: &str) -> String {
    let level = level.trim();
    if level.is_empty() {
        return default_level();
    }
    let lower = level.to_ascii_lowercase();
    if lower == "warning" {
        return "warn".to_owned();
    }
    if LEVELS.contains(&lower.as_str()) {
        lower
    } else {
        level.to_owned()
    }
}

impl LoggingConfig {
    /// The configured level, with `RUST_LOG` appended when set. Falls back to the parts that parse,
    /// and to `info` when nothing does.
    pub fn env_filter(&self) -> EnvFilter {
        let configured = level_directives(&self.level);
        let mut candidates = Vec::with_capacity(3);
        if let Some(env) = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
        {
            candidates.push(format!("{configured},{env}"));
            candidates.push(env);
        }
        candidates.push(configured);

        candidates
            .into_iter()
            .find_map(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(|| EnvFilter::new("info"))
    }
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

static TRACING_INIT: Once = Once::new();

/// Install the global `tracing` subscriber. Only the first call in a process has an effect.
pub fn init_tracing(config: &LoggingConfig) {
    use tracing_subscriber::prelude::*;

    TRACING_INIT.call_once(|| {
        let mut open_error = None;
        let writer = match config.file.as_deref().map(open_log_file) {
            Some(Ok(file)) => BoxMakeWriter::new(Mutex::new(file)),
            Some(Err(err)) => {
                open_error = Some(err);
                BoxMakeWriter::new(std::io::stderr)
            }
            None => BoxMakeWriter::new(std::io::stderr),
        };

        let fmt = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true);
        let layer: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> = if config.json {
            fmt.json().boxed()
        } else {
            fmt.without_time().boxed()
        };

        let installed = tracing::subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(config.env_filter())
                .with(layer),
        )
        .is_ok();

        if let (true, Some(err), Some(path)) = (installed, open_error, config.file.as_ref()) {
            tracing::warn!(
                target: "jmd.config",
                path = %path.display(),
                error = %err,
                "cannot open log file, logging to stderr"
            );
        }
    });
}
