//! Structured logging setup using the `tracing` ecosystem.
//!
//! Console output on stderr plus a daily-rotated file, optionally as JSON
//! lines. The configured level applies to the RoomThere crates; HTTP and TLS
//! internals stay at `warn` so a `debug` run shows requests rather than
//! connection-pool chatter.

use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::rolling;

use crate::constants::LOG_FILE_NAME;
use crate::error::RtResult;

/// Crates whose log level follows the configured one.
const APP_TARGETS: &[&str] = &[
    "roomthere",
    "rt_core",
    "rt_models",
    "rt_api",
    "rt_realtime",
    "rt_services",
];

/// Dependencies that are noisy below `warn`.
const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls", "h2"];

/// Expand a level into filter directives.
///
/// A bare level (`"debug"`) is applied to the RoomThere crates, with
/// everything else at `info` and the HTTP stack at `warn`. A string that
/// already holds directives (`"rt_api=trace,info"`) is used verbatim.
/// Unknown levels fall back to `info`.
pub fn filter_directives(level: &str) -> String {
    let level = level.trim();
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }
    let level = match level.to_ascii_lowercase().as_str() {
        l @ ("trace" | "debug" | "info" | "warn" | "error" | "off") => l.to_string(),
        _ => "info".to_string(),
    };

    let mut directives = vec!["info".to_string()];
    directives.extend(APP_TARGETS.iter().map(|t| format!("{t}={level}")));
    directives.extend(QUIET_TARGETS.iter().map(|t| format!("{t}=warn")));
    directives.join(",")
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG`, when set, overrides `level`.
pub fn init_logging(level: &str, log_dir: &Path, json_output: bool) -> RtResult<LogGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = rolling::daily(log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directives(level)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact();

    let json_layer = json_output.then(|| {
        fmt::layer()
            .with_writer(writer.clone())
            .json()
            .with_current_span(false)
            .with_file(true)
            .with_line_number(true)
    });
    let text_layer = (!json_output).then(|| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_file(true)
            .with_line_number(true)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(json_layer)
        .with(text_layer)
        .init();

    tracing::debug!("logging to {}", log_dir.join(LOG_FILE_NAME).display());

    Ok(LogGuard { _guard: guard })
}

/// Keeps the non-blocking file writer alive; dropping it flushes the file.
pub struct LogGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_level_targets_app_crates() {
        let directives = filter_directives("DEBUG");
        assert!(directives.starts_with("info,"));
        assert!(directives.contains("rt_services=debug"));
        assert!(directives.contains("roomthere=debug"));
        assert!(directives.contains("reqwest=warn"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }

    #[test]
    fn test_explicit_directives_pass_through() {
        assert_eq!(filter_directives("rt_api=trace,warn"), "rt_api=trace,warn");
    }

    #[test]
    fn test_unknown_level_falls_back_to_info() {
        assert!(filter_directives("loud").contains("rt_api=info"));
    }
}
