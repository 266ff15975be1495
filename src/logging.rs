//! Colored stderr logger for the `log` facade
//!
//! The level comes from `MEMSIM_LOG` (`error`, `warn`, `info`, `debug`,
//! `trace` or `off`, any case) and defaults to `warn`.

use log::{Level, LevelFilter, Log, Metadata, Record};

pub const LEVEL_VAR: &str = "MEMSIM_LOG";

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let color = match record.level() {
                Level::Error => 31,
                Level::Warn => 93,
                Level::Info => 34,
                Level::Debug => 32,
                Level::Trace => 90,
            };
            eprintln!(
                "\u{1B}[{}m[{:>5}] {}\u{1B}[0m",
                color,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

/// Parse a level name; `None` for anything unrecognised
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    match name.trim().to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// Install the logger. Calling it twice keeps the first logger.
pub fn init() {
    static LOGGER: StderrLogger = StderrLogger;
    let level = std::env::var(LEVEL_VAR)
        .ok()
        .and_then(|name| parse_level(&name))
        .unwrap_or(LevelFilter::Warn);
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

/// Stop all output, returning the level that was active. Used while the
/// terminal viewer owns the screen.
pub fn silence() -> LevelFilter {
    let previous = log::max_level();
    log::set_max_level(LevelFilter::Off);
    previous
}
