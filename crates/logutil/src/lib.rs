//! Utilities for logging.

use tracing::Level;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// How verbose logging should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<u8> for Verbosity {
    fn from(value: u8) -> Self {
        match value {
            0 => Verbosity::Info,
            1 => Verbosity::Debug,
            _ => Verbosity::Trace,
        }
    }
}

impl From<Verbosity> for Level {
    fn from(value: Verbosity) -> Self {
        match value {
            Verbosity::Info => Level::INFO,
            Verbosity::Debug => Level::DEBUG,
            Verbosity::Trace => Level::TRACE,
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoggingMode {
    /// Human readable, single line per event.
    #[default]
    Compact,
    /// Structured json lines.
    Json,
}

/// Configure the global logger.
///
/// `RUST_LOG` takes precedence over `verbosity` when set.
pub fn configure_global_logger(
    verbosity: Verbosity,
    mode: LoggingMode,
) -> Result<(), SetGlobalDefaultError> {
    let level: Level = verbosity.into();
    let filter = env_filter(LevelFilter::from_level(level));

    match mode {
        LoggingMode::Compact => {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .compact()
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
        LoggingMode::Json => {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
    }
}

/// Initialize logging for tests.
///
/// Safe to call from every test, only the first call installs a subscriber.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(LevelFilter::DEBUG))
        .with_test_writer()
        .try_init();
}

fn env_filter(default: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy()
}
