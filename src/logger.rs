//! Console logger
//!
//! Prints every record as `HH:MM:SS.mmm - LEVEL   - message` on stderr, with
//! a colored level tag. The numeric levels used by the setup file and the
//! console map as 0 off, 1 error, 2 warning, 3 info, 4 debug.

use colored::*;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::time::{SystemTime, UNIX_EPOCH};

static LOGGER: ConsoleLogger = ConsoleLogger;

pub struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        eprintln!(
            "{} - {} - {}",
            timestamp(SystemTime::now()),
            level_tag(record.level()),
            record.args()
        );
    }

    fn flush(&self) {}
}

/// Install the console logger at the given numeric level.
///
/// Safe to call more than once; later calls only change the level.
pub fn init(level: u8) {
    let _ = log::set_logger(&LOGGER);
    set_level(level);
}

/// Change the active level; returns false for a level outside 0..=4
pub fn set_level(level: u8) -> bool {
    match level_filter(level) {
        Some(filter) => {
            log::set_max_level(filter);
            log::debug!("Log level set to {}", filter);
            true
        }
        None => false,
    }
}

pub fn level_filter(level: u8) -> Option<LevelFilter> {
    match level {
        0 => Some(LevelFilter::Off),
        1 => Some(LevelFilter::Error),
        2 => Some(LevelFilter::Warn),
        3 => Some(LevelFilter::Info),
        4 => Some(LevelFilter::Debug),
        _ => None,
    }
}

fn level_tag(level: Level) -> ColoredString {
    let name = match level {
        Level::Warn => "WARNING",
        other => other.as_str(),
    };
    let padded = format!("{:<7}", name);
    match level {
        Level::Error => padded.bright_red().bold(),
        Level::Warn => padded.yellow(),
        Level::Info => padded.bright_green(),
        Level::Debug | Level::Trace => padded.bright_black(),
    }
}

/// Time of day in UTC with milliseconds.
///
/// Not local time: no timezone is applied, so on a host set to another zone
/// the stamps are offset from the wall clock.
fn timestamp(now: SystemTime) -> String {
    let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default();
    let seconds_of_day = since_epoch.as_secs() % 86_400;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        seconds_of_day / 3600,
        (seconds_of_day / 60) % 60,
        seconds_of_day % 60,
        since_epoch.subsec_millis()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_numeric_levels() {
        assert_eq!(level_filter(0), Some(LevelFilter::Off));
        assert_eq!(level_filter(2), Some(LevelFilter::Warn));
        assert_eq!(level_filter(4), Some(LevelFilter::Debug));
        assert_eq!(level_filter(5), None);
    }

    #[test]
    fn test_timestamp_format() {
        let at = UNIX_EPOCH + Duration::from_millis(((13 * 60 + 7) * 60 + 5) * 1000 + 42);
        assert_eq!(timestamp(at), "13:07:05.042");
    }

    #[test]
    fn test_timestamp_wraps_at_utc_midnight() {
        let at = UNIX_EPOCH + Duration::from_secs(3 * 86_400 + 59) + Duration::from_millis(7);
        assert_eq!(timestamp(at), "00:00:59.007");
    }

    #[test]
    fn test_level_tag_is_padded() {
        colored::control::set_override(false);
        assert_eq!(level_tag(Level::Info).to_string(), "INFO   ");
        assert_eq!(level_tag(Level::Warn).to_string(), "WARNING");
    }
}
