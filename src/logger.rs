//! Terminal logger for the `log` facade.
//!
//! One line per record on stderr, level label painted with `ansi_term`:
//! `ERROR unknown instruction with opcode $02 at $C123`.

use std::io::Write;

use ansi_term::Colour::{Blue, Green, Purple, Red, Yellow};
use ansi_term::Style;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

pub struct TermLogger {
    level: LevelFilter,
    colour: bool,
}

impl TermLogger {
    pub fn new(level: LevelFilter, colour: bool) -> Self {
        Self { level, colour }
    }

    fn label(&self, level: Level) -> String {
        let style = if !self.colour {
            Style::new()
        } else {
            match level {
                Level::Error => Red.bold(),
                Level::Warn => Yellow.bold(),
                Level::Info => Green.bold(),
                Level::Debug => Blue.normal(),
                Level::Trace => Purple.normal(),
            }
        };
        style.paint(format!("{level:<5}")).to_string()
    }
}

impl Log for TermLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        // Nowhere left to report a failed stderr write
        let _ = writeln!(stderr, "{} {}", self.label(record.level()), record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Install the terminal logger as the global `log` backend.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    let colour = std::env::var_os("NO_COLOR").is_none();
    log::set_boxed_logger(Box::new(TermLogger::new(level, colour)))?;
    log::set_max_level(level);
    Ok(())
}
