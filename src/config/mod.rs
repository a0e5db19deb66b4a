//! Module: config
//!
//! Purpose: Configuration for DeskSniffer.
//!
//! Architecture:
//! - `DeskConfig`: height limits and control thresholds, `Copy`, passed by
//!   value into the poll-side components
//! - `PinConfig`: GPIO assignment of the sniffer board
//! - `WifiConfig`: credentials baked in at build time (`WIFI_SSID`,
//!   `WIFI_PASS`)
//! - Nothing is persisted: height and motion state reset on restart
//!
//! Safety: Safe. Plain data.

/// Height limits and control thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeskConfig {
    /// Lowest plausible height in millimetres.
    pub min_height_mm: u16,
    /// Highest plausible height in millimetres.
    pub max_height_mm: u16,
    /// Largest accepted jump between two readings (mm).
    pub max_jump_mm: u16,
    /// At or above this height the display has no decimal, so heights are
    /// only known to 10 mm.
    pub coarse_above_mm: u16,
    /// Below this distance to target the actuator is pulsed every other tick.
    pub slow_approach_mm: u16,
    /// Unchanged ticks after which the desk counts as stopped.
    pub settle_ticks: u16,
    /// Poll loop period in milliseconds.
    pub poll_interval_ms: u32,
}

impl DeskConfig {
    /// Calibrated for a VIVO V122EB frame polled every 50 ms.
    pub const DEFAULT: Self = Self {
        min_height_mm: 720,
        max_height_mm: 1200,
        max_jump_mm: 10,
        coarse_above_mm: 1000,
        slow_approach_mm: 10,
        // 25 ticks of 50 ms plus call overhead is ~1.5 s of stability
        settle_ticks: 25,
        poll_interval_ms: 50,
    };

    /// True if `height` lies in the plausible range.
    #[inline]
    pub const fn in_range(&self, height: u16) -> bool {
        height >= self.min_height_mm && height <= self.max_height_mm
    }
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// GPIO assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinConfig {
    /// Display bus data line (input, pulled up).
    pub sda: i32,
    /// Display bus clock line (input, pulled up).
    pub scl: i32,
    /// Desk controller "up" button line (output).
    pub desk_up: i32,
    /// Desk controller "down" button line (output).
    pub desk_down: i32,
    /// Local "up" button (input, pulled up, active low).
    pub button_up: i32,
    /// Local "down" button (input, pulled up, active low).
    pub button_down: i32,
    /// Local middle button, only pulled up so it does not float.
    pub button_middle: i32,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            sda: 12,
            scl: 13,
            desk_up: 33,
            desk_down: 32,
            button_up: 4,
            button_down: 15,
            button_middle: 5,
        }
    }
}

/// Wi-Fi station credentials.
#[derive(Clone, Copy, Debug)]
pub struct WifiConfig {
    pub ssid: &'static str,
    pub password: &'static str,
}

impl WifiConfig {
    /// Credentials from the build environment.
    pub const fn from_build_env() -> Self {
        Self {
            ssid: match option_env!("WIFI_SSID") {
                Some(ssid) => ssid,
                None => "",
            },
            password: match option_env!("WIFI_PASS") {
                Some(password) => password,
                None => "",
            },
        }
    }
}

/// HTTP port of the `/desk` endpoint.
pub const HTTP_PORT: u16 = 80;
