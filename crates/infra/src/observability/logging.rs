use std::path::PathBuf;

use altoro_domain::{AltoroError, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Daily-rotated file inside the configured log directory.
pub const LOG_FILE_NAME: &str = "altoro.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// How the CLI wants its output.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Count of `-v` flags. 0 is warnings only.
    pub verbosity: u8,
    /// JSON lines on stderr instead of the human format.
    pub json: bool,
    /// Also write plain-text logs under this directory.
    pub log_dir: Option<PathBuf>,
}

impl LogOptions {
    fn default_directive(&self) -> &'static str {
        match self.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// `RUST_LOG` wins over `-v` when set.
    fn filter(&self) -> Result<EnvFilter> {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.default_directive()))
            .map_err(|e| AltoroError::Config(format!("log filter: {e}")))
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop, so the caller holds
/// it until exit. `None` when no log directory was given.
///
/// # Errors
/// `AltoroError::Config` for an invalid `RUST_LOG`, an unwritable log
/// directory, or a subscriber that was already installed.
pub fn init_logging(options: LogOptions) -> Result<Option<WorkerGuard>> {
    let filter = options.filter()?;

    let console: BoxedLayer = if options.json {
        fmt::layer().json().with_writer(std::io::stderr).with_current_span(true).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).with_target(false).boxed()
    };
    let mut layers = vec![console];

    let mut guard = None;
    if let Some(dir) = &options.log_dir {
        std::fs::create_dir_all(dir)
            .map_err(|e| AltoroError::Config(format!("log directory {}: {e}", dir.display())))?;
        let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        layers.push(fmt::layer().with_ansi(false).with_writer(writer).boxed());
        guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| AltoroError::Config(format!("logging already initialised: {e}")))?;

    tracing::debug!(verbosity = options.verbosity, json = options.json, "logging initialised");
    Ok(guard)
}
