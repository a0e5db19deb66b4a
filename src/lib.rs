//! # DeskSniffer
//!
//! Reads the height of a standing desk by listening to the bus between its
//! controller and its 3-digit display, and drives the controller's up/down
//! lines to reach a requested height.
//!
//! ## Architecture
//!
//! ```text
//! SDA/SCL edges ─▶ BusCapture (ISR) ─▶ CaptureBuffer ─▶ FrameAssembler
//!                                                          │
//!                                  decoder ◀── 19-bit frames
//!                                     │
//!                               HeightTracker ─▶ MotionController ─▶ up/down
//! ```
//!
//! The capture ring is the only state shared with interrupt context. Every
//! other component is owned by the poll loop ([`Desk`]); the HTTP task talks
//! to it through the [`DeskMailbox`].

#![cfg_attr(not(test), no_std)]

#[cfg(target_os = "espidf")]
extern crate alloc;
#[cfg(target_os = "espidf")]
extern crate std;

pub mod config;
pub mod symbol;
pub mod stream;
pub mod capture;
pub mod decoder;
pub mod assembler;
pub mod height;
pub mod motion;
pub mod buttons;
pub mod mailbox;
pub mod desk;
pub mod http;
pub mod logging;
pub mod log_drain;

#[cfg(target_os = "espidf")]
pub mod hal;

pub use config::{DeskConfig, PinConfig, WifiConfig};
pub use symbol::{Frame, Symbol};
pub use stream::{CaptureBuffer, TransactionState};
pub use capture::BusCapture;
pub use assembler::FrameAssembler;
pub use height::{HeightTracker, Reading};
pub use motion::{Direction, MotionController, Progress};
pub use buttons::{ManualControls, ManualInput};
pub use mailbox::DeskMailbox;
pub use desk::{Desk, TickOutcome};
pub use logging::LogStream;
