//! Desk movement state machine.
//!
//! Drives the desk controller's up/down button lines toward a requested
//! height and decides when the desk has stopped. Pure logic over two
//! `embedded_hal` output pins, fully testable on host.
//!
//! # Approach
//!
//! - Far from target: hold the button every tick
//! - Within `slow_approach_mm`: hold it every other tick to limit overshoot
//! - After release: keep reporting "moving" until the height has not
//!   changed for `settle_ticks` ticks (the frame coasts)

use embedded_hal::digital::OutputPin;

use crate::config::DeskConfig;

/// Which button line to drive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Progress marker for diagnostics, reported by [`MotionController::handle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    /// A move was driven this tick.
    Driving,
    /// Pins released but the height is still changing.
    Overshoot,
    /// Height unchanged, waiting out the settle window.
    Settling,
    /// Settle window elapsed.
    Done,
}

impl Progress {
    /// True while the desk may still be moving.
    #[inline]
    pub const fn is_moving(&self) -> bool {
        !matches!(self, Progress::Done)
    }
}

/// Actuator state machine over the up/down output pins.
pub struct MotionController<P: OutputPin> {
    config: DeskConfig,
    up: P,
    down: P,
    /// Target height, 0 = none.
    requested_height: u16,
    /// Slow-approach parity.
    tick_cycle: bool,
    prev_height: u16,
    unchanged_ticks: u16,
    requested_move: bool,
}

impl<P: OutputPin> MotionController<P> {
    /// Take ownership of both pins and drive them low.
    pub fn new(up: P, down: P, config: DeskConfig) -> Result<Self, P::Error> {
        let mut controller = Self {
            config,
            up,
            down,
            requested_height: 0,
            tick_cycle: false,
            prev_height: 0,
            unchanged_ticks: 0,
            requested_move: false,
        };
        controller.release()?;
        Ok(controller)
    }

    /// One control tick. Returns `true` while the desk is still moving.
    pub fn handle(
        &mut self,
        manual_up: bool,
        manual_down: bool,
        current_height: u16,
    ) -> Result<bool, P::Error> {
        Ok(self
            .handle_progress(manual_up, manual_down, current_height)?
            .is_moving())
    }

    /// Same as [`handle`](Self::handle), with the progress marker.
    pub fn handle_progress(
        &mut self,
        manual_up: bool,
        manual_down: bool,
        current_height: u16,
    ) -> Result<Progress, P::Error> {
        if manual_up || manual_down {
            self.requested_height = 0;
        }

        if manual_up {
            self.drive(Direction::Up, false)?;
        } else if manual_down {
            self.drive(Direction::Down, false)?;
        } else if self.requested_height == 0 || self.requested_height == current_height {
            self.halt_movement()?;
        } else {
            let direction = if self.requested_height > current_height {
                Direction::Up
            } else {
                Direction::Down
            };
            let distance = self.requested_height.abs_diff(current_height);
            self.drive(direction, distance < self.config.slow_approach_mm)?;
        }

        Ok(self.progress(current_height))
    }

    /// Set a new target height.
    ///
    /// Clamped to the plausible range; at or above `coarse_above_mm` it is
    /// rounded down to 10 mm, the display's precision there. Returns the
    /// stored target.
    pub fn request_height(&mut self, height: u16) -> u16 {
        let mut height = height.clamp(self.config.min_height_mm, self.config.max_height_mm);
        if height >= self.config.coarse_above_mm {
            height -= height % 10;
        }
        self.requested_height = height;
        height
    }

    /// Release both lines immediately.
    pub fn halt_movement(&mut self) -> Result<(), P::Error> {
        self.release()?;
        self.requested_move = false;
        Ok(())
    }

    /// Hold "down" to wake a blank display.
    ///
    /// Called every tick until a height is read, then followed by
    /// [`halt_movement`](Self::halt_movement).
    pub fn wake_desk(&mut self) -> Result<(), P::Error> {
        self.down.set_high()
    }

    /// Current target, 0 if none.
    #[inline]
    pub fn requested_height(&self) -> u16 {
        self.requested_height
    }

    /// True if the last tick drove a pin.
    #[inline]
    pub fn is_move_requested(&self) -> bool {
        self.requested_move
    }

    /// Consume the controller, returning the pins.
    pub fn release_pins(self) -> (P, P) {
        (self.up, self.down)
    }

    fn release(&mut self) -> Result<(), P::Error> {
        self.up.set_low()?;
        self.down.set_low()
    }

    /// Drive one line, holding the other low.
    fn drive(&mut self, direction: Direction, slow: bool) -> Result<(), P::Error> {
        self.tick_cycle = !self.tick_cycle;
        let level = !slow || self.tick_cycle;

        let (active, idle) = match direction {
            Direction::Up => (&mut self.up, &mut self.down),
            Direction::Down => (&mut self.down, &mut self.up),
        };
        idle.set_low()?;
        if level {
            active.set_high()?;
        } else {
            active.set_low()?;
        }

        self.requested_move = true;
        Ok(())
    }

    fn progress(&mut self, current_height: u16) -> Progress {
        if self.requested_move {
            self.unchanged_ticks = 0;
            return Progress::Driving;
        }

        if self.prev_height != current_height {
            self.prev_height = current_height;
            self.unchanged_ticks = 0;
            return Progress::Overshoot;
        }

        self.unchanged_ticks = self.unchanged_ticks.saturating_add(1);
        if self.unchanged_ticks > self.config.settle_ticks {
            Progress::Done
        } else {
            Progress::Settling
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct MockPin(Rc<Cell<bool>>);

    impl embedded_hal::digital::ErrorType for MockPin {
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

    #[test]
    fn test_switching_direction_releases_other_line() {
        let up = MockPin::default();
        let down = MockPin::default();
        let mut motion =
            MotionController::new(up.clone(), down.clone(), DeskConfig::DEFAULT).unwrap();

        motion.handle(true, false, 800).unwrap();
        assert!(up.0.get());
        motion.handle(false, true, 800).unwrap();
        assert!(!up.0.get());
        assert!(down.0.get());
    }

    #[test]
    fn test_progress_markers() {
        let up = MockPin::default();
        let down = MockPin::default();
        let mut motion = MotionController::new(up, down, DeskConfig::DEFAULT).unwrap();

        motion.request_height(800);
        assert_eq!(motion.handle_progress(false, false, 790).unwrap(), Progress::Driving);
        assert_eq!(motion.handle_progress(false, false, 800).unwrap(), Progress::Overshoot);
        assert_eq!(motion.handle_progress(false, false, 800).unwrap(), Progress::Settling);
    }
}
