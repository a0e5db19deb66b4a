//! Local up/down buttons.
//!
//! Two pulled-up inputs, pressed = low. No debouncing: the poll period is
//! far longer than any bounce.

use embedded_hal::digital::InputPin;

/// Manual button state for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ManualInput {
    #[default]
    None,
    Up,
    Down,
}

impl ManualInput {
    /// True if either button is held.
    #[inline]
    pub const fn is_engaged(&self) -> bool {
        !matches!(self, ManualInput::None)
    }

    #[inline]
    pub const fn up(&self) -> bool {
        matches!(self, ManualInput::Up)
    }

    #[inline]
    pub const fn down(&self) -> bool {
        matches!(self, ManualInput::Down)
    }
}

/// Reads the two local buttons. Up wins when both are held.
pub struct ManualControls<I: InputPin> {
    up: I,
    down: I,
}

impl<I: InputPin> ManualControls<I> {
    pub fn new(up: I, down: I) -> Self {
        Self { up, down }
    }

    pub fn read(&mut self) -> Result<ManualInput, I::Error> {
        if self.up.is_low()? {
            Ok(ManualInput::Up)
        } else if self.down.is_low()? {
            Ok(ManualInput::Down)
        } else {
            Ok(ManualInput::None)
        }
    }
}
