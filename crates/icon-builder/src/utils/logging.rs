use crate::errors::CliError;
use camino::Utf8PathBuf;
use std::fs::OpenOptions;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "icon_builder=info,icon_export=info,icon_cache=info";

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Suppress the console output.
    pub silent: bool,
    /// Also write the log to this file, without colors.
    pub logfile: Option<Utf8PathBuf>,
    /// Append to `logfile` instead of truncating it.
    pub append: bool,
}

/// Install the global subscriber. Keep the returned guard alive until exit so the
/// file writer gets flushed.
pub fn init_logging(options: &LogOptions) -> Result<Option<WorkerGuard>, CliError> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_FILTER.into());

    let stdout_layer = (!options.silent).then(tracing_subscriber::fmt::layer);

    let (file_guard, file_layer) = match &options.logfile {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
                std::fs::create_dir_all(parent.as_std_path()).map_err(|source| {
                    CliError::LogFile {
                        path: path.clone(),
                        source,
                    }
                })?;
            }

            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .append(options.append)
                .truncate(!options.append)
                .open(path.as_std_path())
                .map_err(|source| CliError::LogFile {
                    path: path.clone(),
                    source,
                })?;

            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            (Some(guard), Some(layer))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(file_guard)
}
