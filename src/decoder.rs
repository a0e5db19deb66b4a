//! AiP650 segment decoding.
//!
//! Pure functions, no state. Bit-to-segment layout of one character:
//!
//! ```text
//!  ─ 4 ─
//! 2     6
//!  ─ 1 ─
//! 3     5
//!  ─ 7 ─    ■ 0 (bit 7 of the data byte: trailing period)
//! ```
//!
//! Bit numbers above are 0-based from the LSB of the 7-bit pattern, except
//! the period which lives in bit 7 of the data byte.

/// Period indicator bit in a segment data byte.
pub const PERIOD_BIT: u8 = 0x80;

/// Bus addresses of the three display segments, most significant first.
pub const SEGMENT_ADDRESSES: [u8; 3] = [0b011_0101, 0b011_0110, 0b011_0111];

/// Bus addresses that also talk on the display bus but carry no digits.
pub const IGNORED_ADDRESSES: [u8; 2] = [0b010_0100, 0b011_0100];

/// Pattern table: 7-bit segment pattern to displayed character.
///
/// Only covers what a desk controller shows. `'5'` could also be an `S`.
const GLYPHS: [(u8, char); 14] = [
    (0b011_1111, '0'),
    (0b000_0110, '1'),
    (0b101_1011, '2'),
    (0b100_1111, '3'),
    (0b110_0110, '4'),
    (0b110_1101, '5'),
    (0b111_1101, '6'),
    (0b000_0111, '7'),
    (0b111_1111, '8'),
    (0b110_1111, '9'),
    (0b000_0000, ' '),
    (0b111_0110, 'H'),
    (0b111_1001, 'E'),
    (0b101_0000, 'R'),
];

/// Where a bus address lands on the display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentSlot {
    /// One of the three digits, 0 = most significant.
    Index(usize),
    /// A known device that is not a digit.
    Ignore,
    /// An address never seen on this bus.
    Unknown,
}

/// Character shown by a segment data byte, `'?'` if unrecognised.
///
/// Bit 7 (the period) is ignored.
#[inline]
pub fn decode_digit(data: u8) -> char {
    let pattern = data & !PERIOD_BIT;
    GLYPHS
        .iter()
        .find(|(bits, _)| *bits == pattern)
        .map(|(_, glyph)| *glyph)
        .unwrap_or('?')
}

/// Segment slot addressed by a 7-bit bus address.
#[inline]
pub fn decode_segment_index(address: u8) -> SegmentSlot {
    if let Some(index) = SEGMENT_ADDRESSES.iter().position(|a| *a == address) {
        SegmentSlot::Index(index)
    } else if IGNORED_ADDRESSES.contains(&address) {
        SegmentSlot::Ignore
    } else {
        SegmentSlot::Unknown
    }
}

/// True if the segment shows a period after its character.
#[inline]
pub const fn has_period(data: u8) -> bool {
    (data & PERIOD_BIT) != 0
}

/// Binary digits of a byte, MSB first, for diagnostics.
pub fn bits_of(byte: u8) -> [u8; 8] {
    let mut out = [b'0'; 8];
    for (i, c) in out.iter_mut().enumerate() {
        if byte & (0x80 >> i) != 0 {
            *c = b'1';
        }
    }
    out
}
