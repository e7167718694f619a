// Boot log ring for the `log` facade
//
// The boot stage has no heap and no console of its own. Records are
// formatted into fixed-width lines and kept in a ring until the platform
// drains them to its UART.

use core::fmt::{self, Write};

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Mutex;

const MAX_LOG_ENTRIES: usize = 64;
const LINE_LEN: usize = 120;

/// One formatted log record.
#[derive(Clone, Copy)]
pub struct LogLine {
    level: Level,
    len: usize,
    buf: [u8; LINE_LEN],
}

impl LogLine {
    const EMPTY: Self = Self {
        level: Level::Trace,
        len: 0,
        buf: [0; LINE_LEN],
    };

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn as_str(&self) -> &str {
        // LineWriter only ever cuts on char boundaries
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }

    /// Line was cut to fit `LINE_LEN`.
    pub fn is_truncated(&self) -> bool {
        self.len == LINE_LEN
    }
}

struct LineWriter<'a> {
    line: &'a mut LogLine,
}

impl Write for LineWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = LINE_LEN - self.line.len;
        let mut n = s.len().min(room);
        while !s.is_char_boundary(n) {
            n -= 1;
        }
        self.line.buf[self.line.len..self.line.len + n].copy_from_slice(&s.as_bytes()[..n]);
        self.line.len += n;
        Ok(())
    }
}

/// Fixed ring of log lines; the oldest line is overwritten when full.
pub struct LogRing {
    lines: [LogLine; MAX_LOG_ENTRIES],
    head: usize,
    count: usize,
    dropped: usize,
}

impl LogRing {
    pub const fn new() -> Self {
        Self {
            lines: [LogLine::EMPTY; MAX_LOG_ENTRIES],
            head: 0,
            count: 0,
            dropped: 0,
        }
    }

    pub fn push(&mut self, level: Level, args: fmt::Arguments<'_>) {
        let slot = (self.head + self.count) % MAX_LOG_ENTRIES;
        if self.count == MAX_LOG_ENTRIES {
            self.head = (self.head + 1) % MAX_LOG_ENTRIES;
            self.dropped += 1;
        } else {
            self.count += 1;
        }

        let line = &mut self.lines[slot];
        line.level = level;
        line.len = 0;
        let _ = LineWriter { line }.write_fmt(args);
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Lines overwritten before they were drained.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Hand every buffered line to `sink`, oldest first, and empty the ring.
    pub fn drain(&mut self, mut sink: impl FnMut(&LogLine)) {
        for i in 0..self.count {
            sink(&self.lines[(self.head + i) % MAX_LOG_ENTRIES]);
        }
        self.head = 0;
        self.count = 0;
    }
}

impl Default for LogRing {
    fn default() -> Self {
        Self::new()
    }
}

static LOG_RING: Mutex<LogRing> = Mutex::new(LogRing::new());
static LOGGER: BootLogger = BootLogger;

/// `log` backend writing into the global ring.
pub struct BootLogger;

impl Log for BootLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        LOG_RING.lock().push(
            record.level(),
            format_args!("[{}] {}", record.level(), record.args()),
        );
    }

    fn flush(&self) {}
}

/// Install the boot logger. Call once, before the pipeline runs.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

/// Drain the global ring into `sink` (typically the UART writer).
pub fn drain(sink: impl FnMut(&LogLine)) {
    LOG_RING.lock().drain(sink);
}

pub fn log_count() -> usize {
    LOG_RING.lock().len()
}
