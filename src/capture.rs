//! Bus capture: edge classification for the AiP650 display bus.
//!
//! The bus is "kinda-I2C": each display segment is its own device and
//! receives exactly one data byte per transaction. Two edge handlers turn
//! line transitions into [`Symbol`]s:
//!
//! ```text
//! SCL rising  ──▶ on_clock_rising(sda)      ──▶ Bit(sda)      (while Active)
//! SDA change  ──▶ on_data_change(scl, sda)  ──▶ Start / Stop  (while SCL high)
//! ```
//!
//! # Rules
//!
//! - Runs in ISR context: never blocks, never allocates, never logs
//! - Only a slot write and a cursor store per edge (plus a counter on
//!   overflow)
//! - The caller samples the line levels, this module only classifies them

use crate::stream::{CaptureBuffer, TransactionState, DEFAULT_CAPTURE_SIZE};
use crate::symbol::Symbol;

/// Producer half of the capture ring.
///
/// Holds only a shared reference to the buffer, so it is `Copy` and both
/// ISR handlers can use the same one.
#[derive(Clone, Copy)]
pub struct BusCapture<'a, const N: usize = DEFAULT_CAPTURE_SIZE> {
    buffer: &'a CaptureBuffer<N>,
}

impl<'a, const N: usize> BusCapture<'a, N> {
    /// Create the producer for `buffer`.
    pub const fn new(buffer: &'a CaptureBuffer<N>) -> Self {
        Self { buffer }
    }

    /// Rising edge on the clock line.
    ///
    /// `data_high` is the data line level sampled in the ISR.
    #[inline]
    pub fn on_clock_rising(&self, data_high: bool) {
        if self.buffer.transaction() == TransactionState::Active {
            self.buffer.push(Symbol::bit(data_high));
        }
    }

    /// Any edge on the data line.
    ///
    /// Only transitions while the clock is high are start/stop conditions.
    #[inline]
    pub fn on_data_change(&self, clock_high: bool, data_high: bool) {
        if !clock_high {
            return;
        }

        match (self.buffer.transaction(), data_high) {
            (TransactionState::Idle, false) => {
                self.buffer.set_transaction(TransactionState::Active);
                self.buffer.push(Symbol::Start);
            }
            (TransactionState::Active, true) => {
                self.buffer.set_transaction(TransactionState::Idle);
                self.buffer.push(Symbol::Stop);
            }
            _ => {}
        }
    }

    /// The buffer this producer writes to.
    #[inline]
    pub fn buffer(&self) -> &'a CaptureBuffer<N> {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_ignored_while_idle() {
        let buffer = CaptureBuffer::<64>::new();
        let capture = BusCapture::new(&buffer);

        capture.on_clock_rising(true);
        assert_eq!(buffer.pending(), 0);
    }

    #[test]
    fn test_start_bit_stop() {
        let buffer = CaptureBuffer::<64>::new();
        let capture = BusCapture::new(&buffer);

        capture.on_data_change(true, false);
        assert_eq!(buffer.transaction(), TransactionState::Active);
        capture.on_clock_rising(true);
        capture.on_clock_rising(false);
        capture.on_data_change(true, true);
        assert_eq!(buffer.transaction(), TransactionState::Idle);

        assert_eq!(buffer.peek(0), Some(Symbol::Start));
        assert_eq!(buffer.peek(1), Some(Symbol::bit(true)));
        assert_eq!(buffer.peek(2), Some(Symbol::bit(false)));
        assert_eq!(buffer.peek(3), Some(Symbol::Stop));
    }

    #[test]
    fn test_data_change_with_clock_low_ignored() {
        let buffer = CaptureBuffer::<64>::new();
        let capture = BusCapture::new(&buffer);

        capture.on_data_change(false, false);
        capture.on_data_change(false, true);
        assert_eq!(buffer.pending(), 0);
        assert_eq!(buffer.transaction(), TransactionState::Idle);
    }

    #[test]
    fn test_repeated_conditions_not_duplicated() {
        let buffer = CaptureBuffer::<64>::new();
        let capture = BusCapture::new(&buffer);

        // Data rising while idle is not a stop
        capture.on_data_change(true, true);
        assert_eq!(buffer.pending(), 0);

        capture.on_data_change(true, false);
        // Data falling again while active is not a second start
        capture.on_data_change(true, false);
        assert_eq!(buffer.pending(), 1);
    }
}
