//! Poll-loop context: one owner for everything the loop touches.
//!
//! # Tick order
//!
//! ```text
//! capture ring ─▶ assemble frames ─▶ refresh height
//!                                        │
//!        HTTP request / buttons ─────────┤
//!                                        ▼
//!                               motion controller ─▶ up/down pins
//!                                        │
//!                         no height yet? ─▶ wake desk
//! ```
//!
//! The capture ring is the only thing shared with the ISR and is passed in
//! by reference on every tick; nothing here is reachable from interrupt
//! context.

use embedded_hal::digital::OutputPin;

use crate::assembler::{AssemblerStats, FrameAssembler};
use crate::buttons::ManualInput;
use crate::config::DeskConfig;
use crate::height::{HeightTracker, Reading};
use crate::logging::{LogStream, LOG_BUFFER_SIZE};
use crate::motion::{MotionController, Progress};
use crate::stream::CaptureBuffer;
use crate::{diag_debug, diag_info, diag_trace, diag_warn};

/// What one tick observed and did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickOutcome {
    /// Last known height after this tick, 0 if unknown.
    pub height: u16,
    /// Result of the noise gate this tick.
    pub reading: Reading,
    /// Frames assembled this tick.
    pub frames: u32,
    /// A move (manual or requested) is still in progress.
    pub moving: bool,
    /// The wake probe is holding "down".
    pub waking: bool,
}

/// Owning context of the poll loop.
pub struct Desk<'a, P: OutputPin, const L: usize = LOG_BUFFER_SIZE> {
    assembler: FrameAssembler,
    tracker: HeightTracker,
    motion: MotionController<P>,
    log: &'a LogStream<L>,
    tick: u32,
    /// A move was started and has not settled yet.
    move_active: bool,
    /// A valid height has been read since power-up.
    booted: bool,
}

impl<'a, P: OutputPin, const L: usize> Desk<'a, P, L> {
    pub fn new(motion: MotionController<P>, config: DeskConfig, log: &'a LogStream<L>) -> Self {
        Self {
            assembler: FrameAssembler::new(),
            tracker: HeightTracker::new(config),
            motion,
            log,
            tick: 0,
            move_active: false,
            booted: false,
        }
    }

    /// Run one poll tick.
    ///
    /// `request` is a target height posted since the last tick.
    pub fn tick<const N: usize>(
        &mut self,
        buffer: &CaptureBuffer<N>,
        manual: ManualInput,
        request: Option<u16>,
    ) -> Result<TickOutcome, P::Error> {
        self.tick = self.tick.wrapping_add(1);
        let tick = self.tick;

        let report = self.assembler.poll(buffer, &mut self.tracker, self.log, tick);
        let reading = self.tracker.refresh();
        match reading {
            Reading::OutOfRange(h) => diag_warn!(self.log, tick, "NOISE, wildly wrong value: {}", h),
            Reading::TooFar(h) => {
                diag_warn!(self.log, tick, "NOISE, too far from last known height: {}", h)
            }
            Reading::Accepted(h) => diag_debug!(self.log, tick, "Height: {}mm", h),
            Reading::Unavailable | Reading::Unchanged => {}
        }
        let height = self.tracker.last_known_height();

        if let Some(target) = request {
            let stored = self.motion.request_height(target);
            diag_info!(self.log, tick, "Requested height: {}mm", stored);
            self.move_active = true;
        }
        if manual.is_engaged() {
            self.move_active = true;
        }

        if self.move_active {
            let progress = self.motion.handle_progress(manual.up(), manual.down(), height)?;
            match progress {
                Progress::Driving => {}
                Progress::Overshoot => diag_trace!(self.log, tick, "o"),
                Progress::Settling => diag_trace!(self.log, tick, "."),
                Progress::Done => diag_info!(self.log, tick, "DONE"),
            }
            self.move_active = progress.is_moving();
        }

        let mut waking = false;
        if !manual.is_engaged() {
            // Last known height never returns to 0, so this only runs
            // until the first reading after power-up
            if height == 0 {
                // A running move already wakes the display
                if !self.move_active {
                    self.motion.wake_desk()?;
                    waking = true;
                }
            } else if !self.booted {
                self.booted = true;
                self.motion.halt_movement()?;
                diag_info!(self.log, tick, "Desk awake at {}mm", height);
            }
        }

        Ok(TickOutcome {
            height,
            reading,
            frames: report.frames,
            moving: self.move_active,
            waking,
        })
    }

    /// Last accepted height, 0 if none yet.
    #[inline]
    pub fn height(&self) -> u16 {
        self.tracker.last_known_height()
    }

    #[inline]
    pub fn tracker(&self) -> &HeightTracker {
        &self.tracker
    }

    #[inline]
    pub fn motion(&self) -> &MotionController<P> {
        &self.motion
    }

    #[inline]
    pub fn assembler_stats(&self) -> AssemblerStats {
        self.assembler.stats()
    }

    /// True once a valid height has been read since power-up.
    #[inline]
    pub fn is_booted(&self) -> bool {
        self.booted
    }

    /// Ticks run so far (the log timestamp).
    #[inline]
    pub fn ticks(&self) -> u32 {
        self.tick
    }

    /// Stop the actuator and drop any running move.
    pub fn halt(&mut self) -> Result<(), P::Error> {
        self.move_active = false;
        self.motion.halt_movement()
    }
}
