//! Shared helpers: mock pins and a bus simulator.

#![allow(dead_code)]

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use desk_sniffer::decoder::{PERIOD_BIT, SEGMENT_ADDRESSES};
use desk_sniffer::{BusCapture, Frame};
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

/// Output pin whose level can be observed through a clone.
#[derive(Clone, Default)]
pub struct MockPin(Rc<Cell<bool>>);

impl MockPin {
    pub fn is_high(&self) -> bool {
        self.0.get()
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set(true);
        Ok(())
    }
}

/// Input pin driven by the test, pulled up (released) by default.
#[derive(Clone)]
pub struct MockButton(Rc<Cell<bool>>);

impl MockButton {
    pub fn released() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    pub fn press(&self) {
        self.0.set(false);
    }

    pub fn release(&self) {
        self.0.set(true);
    }
}

impl ErrorType for MockButton {
    type Error = Infallible;
}

impl InputPin for MockButton {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.get())
    }
}

/// Segment patterns for the digits 0-9.
pub const DIGITS: [u8; 10] = [
    0b011_1111, 0b000_0110, 0b101_1011, 0b100_1111, 0b110_0110, 0b110_1101, 0b111_1101, 0b000_0111,
    0b111_1111, 0b110_1111,
];

/// Clock out one start, `bits`, stop sequence the way the controller does:
/// data settles while the clock is low, then the clock rises.
pub fn send_bits<const N: usize>(capture: &BusCapture<'_, N>, bits: &[bool]) {
    // Start: data falls while clock is high
    capture.on_data_change(true, false);
    let mut data = false;
    for &bit in bits {
        if bit != data {
            capture.on_data_change(false, bit);
            data = bit;
        }
        capture.on_clock_rising(bit);
    }
    // Stop: data low then rises while clock is high
    if data {
        capture.on_data_change(false, false);
    }
    capture.on_data_change(true, true);
}

pub fn send_frame<const N: usize>(capture: &BusCapture<'_, N>, frame: Frame) {
    send_bits(capture, &frame.to_bits());
}

/// Show three characters; `period` is the index the period follows, if any.
pub fn show_digits<const N: usize>(capture: &BusCapture<'_, N>, digits: [u8; 3], period: Option<usize>) {
    for (i, digit) in digits.iter().enumerate() {
        let mut data = DIGITS[*digit as usize];
        if period == Some(i) {
            data |= PERIOD_BIT;
        }
        send_frame(
            capture,
            Frame {
                address: SEGMENT_ADDRESSES[i],
                data,
            },
        );
    }
}
