//! Lock-free hand-off between the HTTP task and the poll loop.
//!
//! The HTTP handlers run on the server's own task. They never touch the
//! desk state directly: requests are dropped into an atomic slot that the
//! poll loop takes on its next tick, and the poll loop publishes the last
//! known height for reads.

use core::sync::atomic::{AtomicU16, Ordering};

/// Shared slots, `'static` in firmware.
pub struct DeskMailbox {
    /// Pending target height, `NO_REQUEST` if none.
    pending: AtomicU16,
    /// Last known height published by the poll loop, 0 if unknown.
    height: AtomicU16,
}

impl DeskMailbox {
    /// Sentinel for "no pending request".
    pub const NO_REQUEST: u16 = u16::MAX;

    pub const fn new() -> Self {
        Self {
            pending: AtomicU16::new(Self::NO_REQUEST),
            height: AtomicU16::new(0),
        }
    }

    /// Post a target height. A newer request replaces an untaken one.
    #[inline]
    pub fn request(&self, height: u16) {
        // Clamping happens on the poll side; keep MAX free for the sentinel
        self.pending
            .store(height.min(Self::NO_REQUEST - 1), Ordering::Release);
    }

    /// Take the pending request, if any.
    #[inline]
    pub fn take_request(&self) -> Option<u16> {
        match self.pending.swap(Self::NO_REQUEST, Ordering::AcqRel) {
            Self::NO_REQUEST => None,
            height => Some(height),
        }
    }

    /// Publish the last known height.
    #[inline]
    pub fn publish_height(&self, height: u16) {
        self.height.store(height, Ordering::Release);
    }

    /// Last published height, 0 if unknown.
    #[inline]
    pub fn height(&self) -> u16 {
        self.height.load(Ordering::Acquire)
    }
}

impl Default for DeskMailbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_taken_once() {
        let mailbox = DeskMailbox::new();
        assert_eq!(mailbox.take_request(), None);

        mailbox.request(900);
        mailbox.request(950);
        assert_eq!(mailbox.take_request(), Some(950));
        assert_eq!(mailbox.take_request(), None);
    }

    #[test]
    fn test_zero_request_is_a_request() {
        let mailbox = DeskMailbox::new();
        mailbox.request(0);
        assert_eq!(mailbox.take_request(), Some(0));
    }

    #[test]
    fn test_height_published() {
        let mailbox = DeskMailbox::new();
        assert_eq!(mailbox.height(), 0);
        mailbox.publish_height(1050);
        assert_eq!(mailbox.height(), 1050);
    }
}
