use core::fmt::Arguments;

use log::{Level, LevelFilter, Log, Metadata, Record};

pub trait Console {
    fn newline(&self);
    fn writef(&self, args: Arguments);
    fn writefln(&self, args: Arguments);
}

/// Forwards `log` records to a [`Console`].
pub struct ConsoleLogger<C: Console> {
    console: C,
    level: LevelFilter
}

impl<C: Console> ConsoleLogger<C> {
    pub const fn new(console: C, level: LevelFilter) -> Self {
        Self { console, level }
    }
}

impl<C: Console + Sync + Send> Log for ConsoleLogger<C> {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let tag = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE"
        };

        self.console.writefln(format_args!("[{}] {}: {}", tag, record.target(), record.args()));
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use std::{string::String, fmt::Write, sync::Mutex};

    use log::{Level, LevelFilter, Log, Record};

    use super::{Console, ConsoleLogger};

    struct BufferConsole {
        output: Mutex<String>
    }

    impl Console for BufferConsole {
        fn newline(&self) {
            self.output.lock().unwrap().push('\n');
        }

        fn writef(&self, args: core::fmt::Arguments) {
            self.output.lock().unwrap().write_fmt(args).unwrap();
        }

        fn writefln(&self, args: core::fmt::Arguments) {
            self.writef(args);
            self.newline();
        }
    }

    fn logger(level: LevelFilter) -> ConsoleLogger<BufferConsole> {
        ConsoleLogger::new(BufferConsole { output: Mutex::new(String::new()) }, level)
    }

    #[test]
    fn test_writes_enabled_records() {
        let logger = logger(LevelFilter::Debug);

        logger.log(&Record::builder()
            .level(Level::Warn)
            .target("diskio")
            .args(format_args!("read failed at {}", 7))
            .build());

        assert_eq!(*logger.console.output.lock().unwrap(), "[WARN] diskio: read failed at 7\n");
    }

    #[test]
    fn test_filters_by_level() {
        let logger = logger(LevelFilter::Warn);

        logger.log(&Record::builder()
            .level(Level::Debug)
            .target("diskio")
            .args(format_args!("fallback"))
            .build());

        assert!(logger.console.output.lock().unwrap().is_empty());
    }
}
