//! Tracing subscriber setup driven by [`LoggingConfig`]

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::LoggingConfig;
use crate::{AssistantError, Result};

/// Build the env filter. `RUST_LOG` wins over the configured level.
fn build_filter(config: &LoggingConfig, verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { config.level.as_str() };
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("travelassist={level},warn")))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// for the lifetime of the program.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<Option<WorkerGuard>> {
    let json = config.format == "json";
    let to_console = matches!(config.output.as_str(), "console" | "both");
    let to_file = matches!(config.output.as_str(), "file" | "both");

    let console_layer = to_console.then(|| {
        let layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
        if json { layer.json().boxed() } else { layer.boxed() }
    });

    let mut guard = None;
    let file_layer = if to_file {
        let path = Path::new(&config.file_path);
        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let prefix = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "travelassist.log".to_string());

        std::fs::create_dir_all(directory)?;
        let appender = Builder::new()
            .rotation(Rotation::DAILY)
            .filename_prefix(prefix)
            .max_log_files(config.max_files.max(1) as usize)
            .build(directory)
            .map_err(|e| {
                AssistantError::config(format!("Failed to create log file appender: {e}"))
            })?;
        let (writer, worker_guard) = tracing_appender::non_blocking(appender);
        guard = Some(worker_guard);

        let layer = fmt::layer().with_writer(writer).with_ansi(false);
        Some(if json { layer.json().boxed() } else { layer.boxed() })
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(build_filter(config, verbose))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| AssistantError::general(format!("Failed to initialize logging: {e}")))?;

    Ok(guard)
}
