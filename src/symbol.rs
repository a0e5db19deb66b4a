//! Module: symbol
//!
//! Purpose: Bus symbols and frames for the AiP650 display bus. A symbol is
//! one classified bus event: a start condition, a stop condition, a
//! single data bit sampled on a rising clock edge, or a gap left by an
//! overflow of the capture ring.
//!
//! Architecture:
//! - 1-byte `Symbol` so the capture ring stays compact
//! - Only buffer order matters, symbols carry no timestamp
//! - A `Frame` is transient, it only exists while the assembler extracts it
//!
//! Safety: Safe. No unsafe blocks. Copy types only.

/// Number of non-marker symbols between a start and a stop condition that
/// make up one frame.
///
/// ```text
/// ADDR (7) | R/W (1) | ACK (1) | DATA (8) | ACK (1) | trailing (1)
/// ```
pub const FRAME_SYMBOLS: u8 = 19;

/// Bit offset of the data byte inside a frame (after address, R/W and ack).
pub const DATA_OFFSET: u8 = 9;

/// A single classified bus event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Symbol {
    /// Data fell while clock was high (transaction begins).
    Start,
    /// Data rose while clock was high (transaction ends).
    Stop,
    /// Data line level sampled on a rising clock edge.
    Bit(bool),
    /// Symbols were dropped here because the capture ring was full.
    Gap,
}

impl Symbol {
    /// Filler value for unused ring slots.
    pub const EMPTY: Self = Symbol::Stop;

    /// Build a bit symbol from a raw line level.
    #[inline]
    pub const fn bit(high: bool) -> Self {
        Symbol::Bit(high)
    }

    /// True for everything that is not a data bit.
    #[inline]
    pub const fn is_marker(&self) -> bool {
        !matches!(self, Symbol::Bit(_))
    }
}

/// One address/data pair carried by the display bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    /// 7-bit device address (one per display segment).
    pub address: u8,
    /// Segment pattern, bit 7 is the trailing period.
    pub data: u8,
}

impl Frame {
    /// Extract a frame from the 19 bits of a session.
    ///
    /// `bits` holds the session MSB-first: the first bit received sits at
    /// bit 18, the last at bit 0. Address is bits 0-6 of the session,
    /// data is bits 9-16; R/W, both acks and the trailing bit are skipped.
    #[inline]
    pub const fn from_session_bits(bits: u32) -> Self {
        let last = (FRAME_SYMBOLS - 1) as u32;
        let address = ((bits >> (last - 6)) & 0x7F) as u8;
        let data = ((bits >> (last - (DATA_OFFSET as u32 + 7))) & 0xFF) as u8;
        Self { address, data }
    }

    /// Encode this frame as the 19 bits a controller would clock out.
    ///
    /// R/W is written as 0 (write), both acks as 0 (ack) and the trailing
    /// bit as 0. Used by bus simulations and tests.
    pub fn to_bits(&self) -> [bool; FRAME_SYMBOLS as usize] {
        let mut bits = [false; FRAME_SYMBOLS as usize];
        for (j, bit) in bits.iter_mut().take(7).enumerate() {
            *bit = (self.address >> (6 - j)) & 1 == 1;
        }
        for j in 0..8 {
            bits[DATA_OFFSET as usize + j] = (self.data >> (7 - j)) & 1 == 1;
        }
        bits
    }
}
