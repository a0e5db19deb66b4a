//! Non-blocking diagnostic logging for DeskSniffer.
//!
//! # Architecture
//!
//! ```text
//! Poll loop              LogStream            Console drain
//! ─────────              ─────────            ─────────────
//!
//! diag_log!() ─────────▶ [L0][L1][L2] ──────▶ stdout / UART
//! fixed buffer            lock-free           blocking ok
//! non-blocking            ring buffer
//! ```
//!
//! # Rules
//!
//! - The capture ISR never logs, not even through this stream
//! - Core modules log through `diag_*!` macros, never `println!`
//! - Messages are dropped (and counted) when the ring is full
//! - One producer per stream; the console drain is the only consumer

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

/// Maximum message length.
pub const MAX_MSG_LEN: usize = 96;

/// Log buffer size (number of entries).
pub const LOG_BUFFER_SIZE: usize = 64;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    /// Convert to string for output.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

/// A single log entry.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct LogEntry {
    /// Poll tick the entry was produced on.
    pub tick: u32,
    /// Log level.
    pub level: LogLevel,
    /// Message length.
    pub len: u8,
    /// Message bytes (not null-terminated).
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    const EMPTY: Self = Self {
        tick: 0,
        level: LogLevel::Info,
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    /// Message text, `"<invalid utf8>"` if a multi-byte char was cut.
    pub fn message(&self) -> &str {
        core::str::from_utf8(&self.msg[..self.len as usize]).unwrap_or("<invalid utf8>")
    }
}

impl Default for LogEntry {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Lock-free log stream (single producer, single consumer).
pub struct LogStream<const N: usize = LOG_BUFFER_SIZE> {
    entries: UnsafeCell<[LogEntry; N]>,
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
    max_level: AtomicU32,
}

// SAFETY: One producer stores write_idx after filling its slot, one consumer
// stores read_idx after copying its slot out.
unsafe impl<const N: usize> Sync for LogStream<N> {}
unsafe impl<const N: usize> Send for LogStream<N> {}

impl<const N: usize> LogStream<N> {
    const MASK: usize = N - 1;

    /// Create a new empty log stream passing everything up to `Debug`.
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Log buffer size must be power of 2");

        Self {
            entries: UnsafeCell::new([LogEntry::EMPTY; N]),
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
            max_level: AtomicU32::new(LogLevel::Debug as u32),
        }
    }

    /// Most verbose level that is still recorded.
    #[inline]
    pub fn set_max_level(&self, level: LogLevel) {
        self.max_level.store(level as u32, Ordering::Relaxed);
    }

    /// True if entries at `level` would be recorded.
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        (level as u32) <= self.max_level.load(Ordering::Relaxed)
    }

    /// Push a log entry (never blocks).
    ///
    /// Returns `true` if message was queued, `false` if filtered or dropped
    /// (ring full).
    #[inline]
    pub fn push(&self, tick: u32, level: LogLevel, msg: &[u8]) -> bool {
        if !self.enabled(level) {
            return false;
        }

        let write = self.write_idx.load(Ordering::Relaxed);
        let read = self.read_idx.load(Ordering::Acquire);

        if write.wrapping_sub(read) >= N as u32 {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        let idx = (write as usize) & Self::MASK;

        // SAFETY: Single producer, slot is outside the unread region.
        unsafe {
            let entry = &mut (*self.entries.get())[idx];
            entry.tick = tick;
            entry.level = level;
            entry.len = msg.len().min(MAX_MSG_LEN) as u8;
            entry.msg[..entry.len as usize].copy_from_slice(&msg[..entry.len as usize]);
        }

        self.write_idx.store(write.wrapping_add(1), Ordering::Release);
        true
    }

    /// Drain next log entry (for the console drain).
    ///
    /// Returns `None` if no entries available.
    #[inline]
    pub fn drain(&self) -> Option<LogEntry> {
        let entry = self.peek()?;
        self.advance();
        Some(entry)
    }

    /// Copy of the next entry, left in the stream.
    #[inline]
    pub fn peek(&self) -> Option<LogEntry> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);

        if read == write {
            return None;
        }

        // SAFETY: Single consumer, slot is inside the unread region
        Some(unsafe { (*self.entries.get())[(read as usize) & Self::MASK] })
    }

    /// Release the entry returned by the last [`peek`](Self::peek).
    #[inline]
    pub fn advance(&self) {
        let read = self.read_idx.load(Ordering::Relaxed);
        if read != self.write_idx.load(Ordering::Acquire) {
            self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        }
    }

    /// Get count of dropped messages.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Take the dropped counter, resetting it (e.g., after reporting).
    #[inline]
    pub fn take_dropped(&self) -> u32 {
        self.dropped.swap(0, Ordering::Relaxed)
    }

    /// Get number of entries waiting to be drained.
    #[inline]
    pub fn pending(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }
}

impl<const N: usize> Default for LogStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a message into a buffer, truncating at its end.
///
/// Returns the number of bytes written.
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    use core::fmt::Write;

    struct BufWriter<'a> {
        buf: &'a mut [u8],
        pos: usize,
    }

    impl<'a> Write for BufWriter<'a> {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            let bytes = s.as_bytes();
            let remaining = self.buf.len() - self.pos;
            let to_write = bytes.len().min(remaining);
            self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
            self.pos += to_write;
            Ok(())
        }
    }

    let mut writer = BufWriter { buf, pos: 0 };
    let _ = core::fmt::write(&mut writer, args);
    writer.pos
}

/// Diagnostic log macro.
///
/// # Example
///
/// ```ignore
/// diag_log!(LogLevel::Info, log, tick, "Requested height: {}mm", height);
/// ```
#[macro_export]
macro_rules! diag_log {
    ($level:expr, $stream:expr, $tick:expr, $($arg:tt)*) => {{
        if $stream.enabled($level) {
            let mut buf = [0u8; $crate::logging::MAX_MSG_LEN];
            let len = $crate::logging::format_to_buffer(&mut buf, format_args!($($arg)*));
            $stream.push($tick, $level, &buf[..len]);
        }
    }};
}

/// Diagnostic info log.
#[macro_export]
macro_rules! diag_info {
    ($stream:expr, $tick:expr, $($arg:tt)*) => {
        $crate::diag_log!($crate::logging::LogLevel::Info, $stream, $tick, $($arg)*)
    };
}

/// Diagnostic warning log.
#[macro_export]
macro_rules! diag_warn {
    ($stream:expr, $tick:expr, $($arg:tt)*) => {
        $crate::diag_log!($crate::logging::LogLevel::Warn, $stream, $tick, $($arg)*)
    };
}

/// Diagnostic error log.
#[macro_export]
macro_rules! diag_error {
    ($stream:expr, $tick:expr, $($arg:tt)*) => {
        $crate::diag_log!($crate::logging::LogLevel::Error, $stream, $tick, $($arg)*)
    };
}

/// Diagnostic debug log.
#[macro_export]
macro_rules! diag_debug {
    ($stream:expr, $tick:expr, $($arg:tt)*) => {
        $crate::diag_log!($crate::logging::LogLevel::Debug, $stream, $tick, $($arg)*)
    };
}

/// Diagnostic trace log (maximum verbosity).
#[macro_export]
macro_rules! diag_trace {
    ($stream:expr, $tick:expr, $($arg:tt)*) => {
        $crate::diag_log!($crate::logging::LogLevel::Trace, $stream, $tick, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_stream_basic() {
        let stream = LogStream::<16>::new();

        assert!(stream.push(1000, LogLevel::Info, b"test message"));
        assert_eq!(stream.pending(), 1);

        let entry = stream.drain().unwrap();
        assert_eq!(entry.tick, 1000);
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.message(), "test message");

        assert_eq!(stream.pending(), 0);
    }

    #[test]
    fn test_log_stream_full() {
        let stream = LogStream::<4>::new();

        assert!(stream.push(1, LogLevel::Info, b"1"));
        assert!(stream.push(2, LogLevel::Info, b"2"));
        assert!(stream.push(3, LogLevel::Info, b"3"));
        assert!(stream.push(4, LogLevel::Info, b"4"));

        // Should drop
        assert!(!stream.push(5, LogLevel::Info, b"5"));
        assert_eq!(stream.dropped(), 1);

        // Drain one, should be able to push again
        stream.drain();
        assert!(stream.push(6, LogLevel::Info, b"6"));
        assert_eq!(stream.take_dropped(), 1);
        assert_eq!(stream.dropped(), 0);
    }

    #[test]
    fn test_level_filter() {
        let stream = LogStream::<4>::new();
        assert!(!stream.push(1, LogLevel::Trace, b"hidden"));

        stream.set_max_level(LogLevel::Trace);
        assert!(stream.push(1, LogLevel::Trace, b"shown"));

        stream.set_max_level(LogLevel::Warn);
        assert!(!stream.push(1, LogLevel::Info, b"hidden"));
        assert_eq!(stream.dropped(), 0);
    }

    #[test]
    fn test_macro_formats() {
        let stream = LogStream::<4>::new();
        crate::diag_warn!(stream, 7, "Unknown device: {}", 42);

        let entry = stream.drain().unwrap();
        assert_eq!(entry.level, LogLevel::Warn);
        assert_eq!(entry.tick, 7);
        assert_eq!(entry.message(), "Unknown device: 42");
    }

    #[test]
    fn test_format_to_buffer_truncates() {
        let mut buf = [0u8; 5];
        let len = format_to_buffer(&mut buf, format_args!("Hello {}", 42));
        assert_eq!(&buf[..len], b"Hello");
    }

    #[test]
    fn test_peek_leaves_entry() {
        let stream = LogStream::<4>::new();
        assert!(stream.peek().is_none());
        stream.push(1, LogLevel::Info, b"kept");

        assert_eq!(stream.peek().unwrap().message(), "kept");
        assert_eq!(stream.pending(), 1);

        stream.advance();
        assert_eq!(stream.pending(), 0);
        // Nothing left to release
        stream.advance();
        assert_eq!(stream.pending(), 0);
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Trace);
    }
}
