//! Utilities for logging.

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Single line, human readable output.
    #[default]
    HumanReadable,
    /// One json object per line.
    Json,
}

/// Configure the global tracing subscriber.
///
/// `default_level` is used for any target not covered by `RUST_LOG`. Calling
/// this more than once is a no-op, the first configured subscriber wins.
pub fn configure_global_logger<W>(default_level: Level, format: LogFormat, writer: W)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = env_filter(default_level);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true);

    let result = match format {
        LogFormat::HumanReadable => builder.try_init(),
        LogFormat::Json => builder
            .json()
            .with_current_span(false)
            .with_file(true)
            .with_line_number(true)
            .try_init(),
    };

    if let Err(e) = result {
        tracing::debug!(%e, "global logger already configured");
    }
}

/// Build a filter from `RUST_LOG`, falling back to `default_level`.
pub fn env_filter(default_level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(default_level).into())
        .from_env_lossy()
}

/// Map a verbosity count (e.g. number of `-v` flags) to a level.
pub fn level_from_verbosity(verbose: u8) -> Level {
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}
