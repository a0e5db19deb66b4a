//! Desk height tracking.
//!
//! Turns the three segment states into a height in millimetres and gates
//! it against noise. The display shows `72.0` below one metre and `105`
//! above it, so a reading without any period is scaled by 10.
//!
//! Segments are written one frame at a time, never as a triple, so a
//! reading taken mid-update can be off by a digit. The noise gate is what
//! keeps those out.

use crate::config::DeskConfig;

/// What one display segment currently shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentState {
    /// Decoded character (`'0'..='9'`, `' '`, `'H'`, `'E'`, `'R'`, `'?'`).
    pub glyph: char,
    /// Period lit after the character.
    pub period_after: bool,
}

impl SegmentState {
    /// Blank segment, what the display shows before the first frame.
    pub const BLANK: Self = Self {
        glyph: ' ',
        period_after: false,
    };

    pub const fn new(glyph: char, period_after: bool) -> Self {
        Self {
            glyph,
            period_after,
        }
    }

    /// True if this character ends a numeric reading.
    ///
    /// `'?'` is included: an undecodable pattern is not a digit.
    #[inline]
    pub const fn is_terminator(&self) -> bool {
        matches!(self.glyph, ' ' | 'H' | 'E' | 'R' | '?')
    }
}

impl Default for SegmentState {
    fn default() -> Self {
        Self::BLANK
    }
}

/// Outcome of offering a candidate height to the tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reading {
    /// No numeric reading this cycle (candidate was 0).
    Unavailable,
    /// Same value as the last known height.
    Unchanged,
    /// New last known height.
    Accepted(u16),
    /// Outside the plausible range.
    OutOfRange(u16),
    /// Too far from the last known height.
    TooFar(u16),
}

impl Reading {
    /// True for the two noise rejections.
    #[inline]
    pub const fn is_noise(&self) -> bool {
        matches!(self, Reading::OutOfRange(_) | Reading::TooFar(_))
    }
}

/// Segment display state plus the last accepted height.
#[derive(Clone, Debug)]
pub struct HeightTracker {
    config: DeskConfig,
    segments: [SegmentState; 3],
    /// 0 until a reading has been accepted.
    last_known: u16,
}

impl HeightTracker {
    /// Create a tracker with a blank display and no known height.
    pub const fn new(config: DeskConfig) -> Self {
        Self {
            config,
            segments: [SegmentState::BLANK; 3],
            last_known: 0,
        }
    }

    /// Overwrite one segment. `index` outside 0..3 is ignored.
    #[inline]
    pub fn set_segment(&mut self, index: usize, state: SegmentState) {
        if let Some(segment) = self.segments.get_mut(index) {
            *segment = state;
        }
    }

    /// Current segment states, most significant first.
    #[inline]
    pub fn segments(&self) -> &[SegmentState; 3] {
        &self.segments
    }

    /// Height shown by the display in millimetres, 0 if none.
    pub fn compute_height(&self) -> u16 {
        let mut height: u16 = 0;
        let mut has_period = false;

        for (i, segment) in self.segments.iter().enumerate() {
            if segment.is_terminator() {
                return 0;
            }
            has_period |= segment.period_after;

            let digit = segment.glyph.to_digit(10).unwrap_or(0) as u16;
            height += digit * 10u16.pow(2 - i as u32);
        }

        if !has_period && height != 0 {
            height *= 10;
        }
        height
    }

    /// Offer a candidate height to the noise gate.
    pub fn accept(&mut self, candidate: u16) -> Reading {
        if candidate == 0 {
            return Reading::Unavailable;
        }
        if candidate == self.last_known {
            return Reading::Unchanged;
        }
        if !self.config.in_range(candidate) {
            return Reading::OutOfRange(candidate);
        }
        if self.last_known != 0 && candidate.abs_diff(self.last_known) > self.config.max_jump_mm {
            return Reading::TooFar(candidate);
        }

        self.last_known = candidate;
        Reading::Accepted(candidate)
    }

    /// Compute a candidate from the segments and gate it.
    #[inline]
    pub fn refresh(&mut self) -> Reading {
        let candidate = self.compute_height();
        self.accept(candidate)
    }

    /// Last accepted height, 0 if no valid reading was ever accepted.
    #[inline]
    pub fn last_known_height(&self) -> u16 {
        self.last_known
    }
}

impl Default for HeightTracker {
    fn default() -> Self {
        Self::new(DeskConfig::DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_display_has_no_height() {
        let tracker = HeightTracker::default();
        assert_eq!(tracker.compute_height(), 0);
    }

    #[test]
    fn test_out_of_range_index_ignored() {
        let mut tracker = HeightTracker::default();
        tracker.set_segment(3, SegmentState::new('9', false));
        assert_eq!(tracker.segments(), &[SegmentState::BLANK; 3]);
    }

    #[test]
    fn test_question_mark_terminates() {
        let mut tracker = HeightTracker::default();
        tracker.set_segment(0, SegmentState::new('7', false));
        tracker.set_segment(1, SegmentState::new('?', true));
        tracker.set_segment(2, SegmentState::new('0', false));
        assert_eq!(tracker.compute_height(), 0);
    }

    #[test]
    fn test_noise_classification() {
        assert!(Reading::OutOfRange(50).is_noise());
        assert!(Reading::TooFar(900).is_noise());
        assert!(!Reading::Accepted(720).is_noise());
        assert!(!Reading::Unavailable.is_noise());
    }
}
