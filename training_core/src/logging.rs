//! Logging infrastructure for the training tools.
//!
//! Logs go to stderr (or a file) so the session UI owns stdout.

use std::io::Write;
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging at WARN, overridable with RUST_LOG.
///
/// The runner prints its own progress, so the default is kept quiet.
pub fn init() {
    init_with_level("warn")
}

/// Initialize stderr logging with a specific default level
///
/// This can still be overridden by RUST_LOG environment variable.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
}

/// Append logs to `path` instead of the terminal.
///
/// Used by interactive sessions where stderr shares the screen with the runner.
/// Falls back to stderr if the file cannot be opened.
pub fn init_to_file(path: &Path, default_level: &str) {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_path = path.to_path_buf();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(move || -> Box<dyn Write + Send> {
                    match std::fs::File::options()
                        .create(true)
                        .append(true)
                        .open(&log_path)
                    {
                        Ok(f) => Box::new(f),
                        Err(_) => Box::new(std::io::stderr()),
                    }
                }),
        )
        .try_init();
}

/// Initialize logging for testing (captures logs for test output)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
