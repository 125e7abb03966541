use chrono::Local;
use log::{set_logger, set_max_level, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Installs the [`Logger`] with the given maximum `level`.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    set_logger(&Logger)?;
    set_max_level(level);
    Ok(())
}

/// Writes log records to stderr, keeping stdout free for command output.
#[derive(Copy, Clone, Debug)]
pub struct Logger;

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let now = Local::now().format("%Y-%m-%d %H:%M:%S");

        let level = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };

        eprintln!(
            "[{}] [{}] [{}] {}",
            now,
            record.target(),
            level,
            record.args()
        );
    }

    fn flush(&self) {}
}
