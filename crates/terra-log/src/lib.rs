//! Structured logging for the terrain explorer.
//!
//! Console output carries uptime timestamps and targets. Debug builds also
//! write newline-delimited JSON to a file in the platform log directory.
//! `RUST_LOG` wins over the configured level. Records emitted through the
//! `log` facade by the render and config crates are forwarded into the same
//! subscriber.

use std::path::Path;

use terra_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Targets that are noisy at `info` and below.
const QUIET_TARGETS: &str = "wgpu=warn,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Name of the JSON log file written in debug builds.
pub const LOG_FILE_NAME: &str = "terra.log";

/// Build the filter directive string from the configured level.
///
/// The quiet-target directives are appended unless the configured level
/// already mentions them.
pub fn filter_directives(config: Option<&Config>) -> String {
    let level = config
        .map(|c| c.debug.log_level.trim())
        .filter(|l| !l.is_empty())
        .unwrap_or("info");

    if level.contains("wgpu") || level.contains("naga") {
        level.to_string()
    } else {
        format!("{level},{QUIET_TARGETS}")
    }
}

/// Initialize the global subscriber.
///
/// * `log_dir` - directory for the JSON log file (debug builds only)
/// * `debug_build` - enables file logging
/// * `config` - source of the level override
///
/// Calling this twice panics inside `tracing-subscriber`; call it once from
/// `main`.
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config)));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(false)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join(LOG_FILE_NAME))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}
