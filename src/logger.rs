use std::io::{IsTerminal, Write};

use anstyle::{AnsiColor, Style};
use log::{Level, LevelFilter, Log, Metadata, Record};

struct AhoyLogger {
    filter: LevelFilter,
    color: bool,
}

impl Log for AhoyLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = level_name(record.level());
        let mut stderr = std::io::stderr().lock();
        let _ = if self.color {
            let style = level_style(record.level());
            writeln!(stderr, "{style}[{level}]{style:#} {}", record.args())
        } else {
            writeln!(stderr, "[{level}] {}", record.args())
        };
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Resolves the active level: `RUST_LOG` wins, then the verbose flag.
fn level_filter(verbose: bool, rust_log: Option<&str>) -> LevelFilter {
    rust_log
        .and_then(|s| s.parse().ok())
        .unwrap_or(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Error => "error",
        Level::Warn => "warn",
        Level::Info => "info",
        Level::Debug => "debug",
        Level::Trace => "trace",
    }
}

fn level_style(level: Level) -> Style {
    let color = match level {
        Level::Error => AnsiColor::Red,
        Level::Warn => AnsiColor::Yellow,
        Level::Info => AnsiColor::Blue,
        Level::Debug | Level::Trace => AnsiColor::BrightBlack,
    };
    Style::new().fg_color(Some(anstyle::Color::Ansi(color)))
}

/// Initialize the global logger. Must be called once before any logging.
///
/// # Errors
///
/// Returns `SetLoggerError` if a logger was already installed.
pub fn init(verbose: bool) -> Result<(), log::SetLoggerError> {
    let filter = level_filter(verbose, std::env::var("RUST_LOG").ok().as_deref());
    let logger = AhoyLogger {
        filter,
        color: std::io::stderr().is_terminal(),
    };
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(filter);
    Ok(())
}
