//! Frame assembly: the consumer half of the capture ring.
//!
//! Called once per poll tick. Walks the unread symbols, counts the bits of
//! each start/stop session and turns every 19-bit session into a
//! [`Frame`]. Frames addressed to a display segment update the
//! [`HeightTracker`].
//!
//! # Rules
//!
//! - Scan is bounded by a snapshot of the write head taken at entry
//! - Session bits are kept across ticks, so a frame split by a poll
//!   boundary still assembles
//! - Malformed sessions are discarded without touching segment state
//! - A gap in the capture poisons the session it falls in: that session is
//!   discarded at the next stop even if its length happens to be 19.
//!   Sessions closed before the gap are unaffected

use crate::decoder::{self, SegmentSlot};
use crate::height::{HeightTracker, SegmentState};
use crate::logging::LogStream;
use crate::stream::CaptureBuffer;
use crate::symbol::{Frame, Symbol, FRAME_SYMBOLS};
use crate::{diag_trace, diag_warn};

/// Per-tick assembly result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    /// Symbols consumed this tick.
    pub symbols: u32,
    /// Valid frames extracted this tick.
    pub frames: u32,
    /// Segment states written this tick.
    pub segment_updates: u32,
}

/// Running counters since boot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssemblerStats {
    pub frames: u32,
    pub malformed: u32,
    pub unknown_addresses: u32,
    pub overflow_resyncs: u32,
}

/// Consumer of the capture ring.
#[derive(Clone, Debug, Default)]
pub struct FrameAssembler {
    /// Non-marker symbols since the last stop.
    session_count: u8,
    /// Session bits, first received in the highest used position.
    session_bits: u32,
    /// Set when symbols may have been lost inside the current session.
    poisoned: bool,
    stats: AssemblerStats,
}

impl FrameAssembler {
    pub const fn new() -> Self {
        Self {
            session_count: 0,
            session_bits: 0,
            poisoned: false,
            stats: AssemblerStats {
                frames: 0,
                malformed: 0,
                unknown_addresses: 0,
                overflow_resyncs: 0,
            },
        }
    }

    /// Counters since boot.
    #[inline]
    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }

    /// Bits collected in the session in progress.
    #[inline]
    pub fn session_count(&self) -> u8 {
        self.session_count
    }

    /// Consume everything captured so far.
    pub fn poll<const N: usize, const L: usize>(
        &mut self,
        buffer: &CaptureBuffer<N>,
        tracker: &mut HeightTracker,
        log: &LogStream<L>,
        tick: u32,
    ) -> AssemblyReport {
        let mut report = AssemblyReport::default();

        let snapshot = buffer.write_head();
        let mut idx = buffer.read_head();

        while idx != snapshot {
            let Some(symbol) = buffer.peek(idx) else {
                break;
            };
            idx = idx.wrapping_add(1);
            report.symbols += 1;

            match symbol {
                Symbol::Start => {}
                Symbol::Bit(high) => {
                    self.session_bits = (self.session_bits << 1) | high as u32;
                    self.session_count = self.session_count.saturating_add(1);
                }
                Symbol::Stop => {
                    if let Some(frame) = self.close_session(log, tick) {
                        report.frames += 1;
                        if self.apply(frame, tracker, log, tick) {
                            report.segment_updates += 1;
                        }
                    }
                }
                Symbol::Gap => {
                    self.poisoned = true;
                    self.stats.overflow_resyncs += 1;
                    diag_warn!(log, tick, "Capture overflow, {} symbols lost", buffer.overflows());
                }
            }
        }

        buffer.consume_to(idx);

        // Drained and at rest: nothing can still belong to this session
        if buffer.is_quiescent(snapshot) && self.session_count != 0 {
            diag_trace!(log, tick, "Dropping {} stray bits", self.session_count);
            self.reset_session();
        }

        report
    }

    /// End the current session, returning its frame if well formed.
    fn close_session<const L: usize>(&mut self, log: &LogStream<L>, tick: u32) -> Option<Frame> {
        let count = self.session_count;
        let poisoned = self.poisoned;
        let bits = self.session_bits;
        self.reset_session();

        if count == FRAME_SYMBOLS && !poisoned {
            self.stats.frames += 1;
            Some(Frame::from_session_bits(bits))
        } else {
            self.stats.malformed += 1;
            diag_trace!(log, tick, "Discarding session of {} bits", count);
            None
        }
    }

    /// Route a frame to its segment. Returns true if a segment was written.
    fn apply<const L: usize>(
        &mut self,
        frame: Frame,
        tracker: &mut HeightTracker,
        log: &LogStream<L>,
        tick: u32,
    ) -> bool {
        match decoder::decode_segment_index(frame.address) {
            SegmentSlot::Index(index) => {
                let state = SegmentState::new(
                    decoder::decode_digit(frame.data),
                    decoder::has_period(frame.data),
                );
                tracker.set_segment(index, state);
                true
            }
            SegmentSlot::Ignore => false,
            SegmentSlot::Unknown => {
                self.stats.unknown_addresses += 1;
                let bits = decoder::bits_of(frame.address);
                diag_warn!(
                    log,
                    tick,
                    "Unknown i2c device: {}",
                    core::str::from_utf8(&bits).unwrap_or("?")
                );
                false
            }
        }
    }

    fn reset_session(&mut self) {
        self.session_count = 0;
        self.session_bits = 0;
        self.poisoned = false;
    }
}
