//! Console output for the diagnostic log.
//!
//! Drains a [`LogStream`] into any `core::fmt::Write` sink. On the firmware
//! the sink is stdout (UART0, 115200 baud); on host it is a `String`.
//!
//! Format: `[      tick] LEVEL: message\n`

use core::fmt::Write;

use crate::logging::{LogEntry, LogStream};

/// Write one entry to `sink`.
pub fn write_entry<W: Write>(sink: &mut W, entry: &LogEntry) -> core::fmt::Result {
    writeln!(
        sink,
        "[{:10}] {}: {}",
        entry.tick,
        entry.level.as_str(),
        entry.message()
    )
}

/// Drain every pending entry into `sink`, then report drops if any.
///
/// An entry the sink rejects stays queued for the next drain, and so does
/// the drop count.
///
/// Returns the number of entries written.
pub fn drain_to<W: Write, const N: usize>(stream: &LogStream<N>, sink: &mut W) -> usize {
    let mut written = 0;

    while let Some(entry) = stream.peek() {
        if write_entry(sink, &entry).is_err() {
            return written;
        }
        stream.advance();
        written += 1;
    }

    let dropped = stream.take_dropped();
    if dropped > 0 {
        let _ = writeln!(sink, "[WARN] Dropped: {}", dropped);
    }

    written
}

/// `core::fmt::Write` adapter for stdout.
#[cfg(target_os = "espidf")]
pub struct Stdout;

#[cfg(target_os = "espidf")]
impl Write for Stdout {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        use std::io::Write as _;
        std::io::stdout()
            .write_all(s.as_bytes())
            .map_err(|_| core::fmt::Error)
    }
}
