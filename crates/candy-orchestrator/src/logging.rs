use std::fs;
use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use candy_configuration::logging::LoggingConfiguration;
use tracing::Level;
use tracing::event;
use tracing_appender::non_blocking::NonBlocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::Registry;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::filter::Filtered;
use tracing_subscriber::fmt::Layer;
use tracing_subscriber::fmt::format::Format;
use tracing_subscriber::fmt::format::Json;
use tracing_subscriber::fmt::format::JsonFields;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload;
use tracing_subscriber::reload::Handle;

pub const TRACING_LEVEL_VARIABLE: &str = "TRACING_LEVEL";

type LogLayer =
    Filtered<Layer<Registry, JsonFields, Format<Json>, NonBlocking>, EnvFilter, Registry>;

#[derive(Clone, Debug)]
pub struct LogHandles {
    pub file_handle: Handle<LogLayer, Registry>,
}

impl LogHandles {
    /// Replaces the filter of the running file layer, e.g. with
    /// `"candy_dispatch_engine=debug,info"`.
    pub fn set_level(&self, directives: &str) -> Result<()> {
        let env_filter = EnvFilter::try_new(directives)
            .with_context(|| format!("invalid tracing directives '{directives}'"))?;

        self.file_handle
            .modify(|file_layer| *file_layer.filter_mut() = env_filter)
            .context("could not reload the file log filter")?;

        event!(Level::INFO, directives, "changed log level");
        Ok(())
    }
}

/// Installs the global subscriber: JSON lines written to
/// `<log_dir>/<file_name>` through a non-blocking writer. Log files left
/// over from earlier runs are deleted first. Keep the returned guard alive
/// for as long as records should be flushed.
pub fn setup_logging(logging: &LoggingConfiguration) -> Result<(LogHandles, WorkerGuard)> {
    fs::create_dir_all(&logging.log_dir).with_context(|| {
        format!("could not create log directory {}", logging.log_dir.display())
    })?;
    remove_previous_log_files(&logging.log_dir)?;

    let file_appender = tracing_appender::rolling::never(&logging.log_dir, &logging.file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let directives =
        dotenvy::var(TRACING_LEVEL_VARIABLE).unwrap_or_else(|_| logging.level.clone());
    let env_filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid tracing directives '{directives}'"))?;

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_file(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_current_span(true)
        .with_filter(env_filter);

    let (file_layer, file_handle) = reload::Layer::new(file_layer);

    tracing_subscriber::registry()
        .with(file_layer)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    event!(Level::INFO, %directives, "starting logging");
    Ok((LogHandles { file_handle }, guard))
}

fn remove_previous_log_files(log_dir: &Path) -> Result<()> {
    let previous_log_files = fs::read_dir(log_dir)
        .with_context(|| format!("could not read log directory {}", log_dir.display()))?;

    for log_file in previous_log_files {
        let path = log_file?.path();
        if path.is_file() && path.extension().is_some_and(|extension| extension == "log") {
            fs::remove_file(&path)
                .with_context(|| format!("could not remove old log file {}", path.display()))?;
        }
    }
    Ok(())
}
