//! Tracing setup for the poll-loop commands.
//!
//! Diagnostics go to stderr so stdout stays free for piping. Text
//! output uses uptime timestamps: the loops log frames continuously and
//! offsets from process start line up with poll cycles better than
//! wall-clock time does.

use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::time::uptime;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Compact human-readable lines with uptime timestamps.
    Text,
    /// One JSON object per event.
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

pub fn init_logging(format: LogFormat, level: LogLevel) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(LevelFilter::from(level))
        .with_target(false)
        .with_ansi(false);

    match format {
        LogFormat::Text => {
            let _ = builder.compact().with_timer(uptime()).try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
