//! Structured Logger
//!
//! Wraps `tracing` to provide JSON-formatted output, file rotation (NDJSON),
//! and environment-based level control.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global structured logger: a console layer on stderr plus a
/// daily-rolling NDJSON file `tagscan.<date>.log` under `log_dir`.
///
/// `RUST_LOG` overrides `level`. Console output stays off stdout so the
/// record JSON printed there is never interleaved with logs. If the log
/// directory cannot be created, only the console layer is installed.
/// Calling this twice is a no-op.
pub fn init_logger<P: AsRef<Path>>(log_dir: P, level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(true);

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("tagscan")
        .filename_suffix("log")
        .build(log_dir.as_ref());

    let file_error = file_appender.as_ref().err().map(|e| e.to_string());
    let file_layer = file_appender.ok().map(|appender| {
        fmt::layer()
            .json()
            .with_writer(appender)
            .with_ansi(false)
    });

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    if let (true, Some(error)) = (installed, file_error) {
        tracing::warn!(
            dir = %log_dir.as_ref().display(),
            error = %error,
            "File logging disabled; could not open log directory"
        );
    }
}
