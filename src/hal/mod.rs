//! Hardware Abstraction Layer for the desk sniffer.
//!
//! Thin wrappers around ESP-IDF peripherals.
//! Business logic stays in core modules, HAL is just I/O.

pub mod bus;
pub mod net;

pub use bus::BusSniffer;
pub use net::{connect_wifi, serve};
