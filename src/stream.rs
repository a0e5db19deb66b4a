//! Lock-free SPSC (Single Producer, Single Consumer) capture ring.
//!
//! Every symbol sniffed off the display bus flows through here.
//!
//! # Architecture
//!
//! ```text
//! GPIO ISR ──────▶ CaptureBuffer ──────▶ FrameAssembler
//! (producer)       (lock-free)            (poll loop)
//! ```
//!
//! # Rules
//!
//! - Only the ISR stores `write_idx`, the transaction state and the
//!   overflow counter
//! - Only the poll loop stores `read_idx`
//! - Only atomic operations for synchronization
//! - No operation shall block
//!
//! # Overflow
//!
//! Drop-new: a symbol that does not fit is discarded and `overflows` is
//! incremented. The last slot is kept for a [`Symbol::Gap`], written by the
//! first drop, so the consumer sees exactly where symbols went missing.
//! Later drops before the consumer frees space share that gap.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::symbol::Symbol;

/// Default capture size: 4096 symbols.
/// One segment update is 21 symbols, so this holds ~190 frames.
pub const DEFAULT_CAPTURE_SIZE: usize = 4096;

/// Bus transaction state, owned by the producer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionState {
    /// Between a stop and the next start: clock edges are not sampled.
    Idle,
    /// Between a start and a stop: clock edges are sampled as bits.
    Active,
}

/// Lock-free SPSC ring buffer of bus symbols.
///
/// # Safety
///
/// This type uses `UnsafeCell` internally but is safe to use because:
/// - Single producer (the GPIO ISR), enforced by design
/// - Single consumer (the poll loop), enforced by design
/// - A slot is only written while it lies outside `read_idx..write_idx`
/// - A slot is only read while it lies inside `read_idx..write_idx`
///
/// # Memory Ordering
///
/// - Producer writes the slot, then `write_idx.store(Release)`
/// - Consumer `write_idx.load(Acquire)` before reading slots
/// - Consumer `read_idx.store(Release)` hands slots back to the producer
pub struct CaptureBuffer<const N: usize = DEFAULT_CAPTURE_SIZE> {
    /// Ring buffer of symbols.
    slots: UnsafeCell<[Symbol; N]>,

    /// Next write index (monotonically increasing, wraps via mask).
    write_idx: AtomicU32,

    /// Next read index (monotonically increasing, wraps via mask).
    read_idx: AtomicU32,

    /// True while a bus transaction is in progress.
    active: AtomicBool,

    /// Symbols dropped because the ring was full (never cleared).
    overflows: AtomicU32,
}

// SAFETY: Single producer, single consumer, atomic coordination.
// No mutable aliasing possible within the rules above.
unsafe impl<const N: usize> Sync for CaptureBuffer<N> {}
unsafe impl<const N: usize> Send for CaptureBuffer<N> {}

impl<const N: usize> CaptureBuffer<N> {
    /// Mask for wrapping index to buffer size.
    /// N must be a power of 2.
    const MASK: usize = N - 1;

    /// Create a new empty buffer in the idle state.
    ///
    /// # Panics
    ///
    /// Panics at compile time if N is not a power of 2.
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Capture size must be power of 2");
        assert!(N >= 2, "Capture size must leave room for a gap");

        Self {
            slots: UnsafeCell::new([Symbol::EMPTY; N]),
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            active: AtomicBool::new(false),
            overflows: AtomicU32::new(0),
        }
    }

    // ------------------------------------------------------------------
    // Producer side (ISR only)
    // ------------------------------------------------------------------

    /// Append a symbol.
    ///
    /// Returns `false` and records an overflow if the ring is full. At most
    /// `N - 1` symbols are held; the last slot only ever takes a gap.
    ///
    /// # Timing
    ///
    /// O(1), never blocks, never allocates.
    #[inline]
    pub fn push(&self, symbol: Symbol) -> bool {
        let write = self.write_idx.load(Ordering::Relaxed);
        let read = self.read_idx.load(Ordering::Acquire);
        let used = write.wrapping_sub(read);

        if used >= (N - 1) as u32 {
            self.overflows.fetch_add(1, Ordering::Relaxed);
            if used == (N - 1) as u32 {
                self.write_slot(write, Symbol::Gap);
            }
            return false;
        }

        self.write_slot(write, symbol);
        true
    }

    #[inline]
    fn write_slot(&self, write: u32, symbol: Symbol) {
        // SAFETY: Single producer, slot is outside the unread region
        unsafe {
            (*self.slots.get())[(write as usize) & Self::MASK] = symbol;
        }
        self.write_idx.store(write.wrapping_add(1), Ordering::Release);
    }

    /// Set the transaction state.
    #[inline]
    pub fn set_transaction(&self, state: TransactionState) {
        self.active
            .store(state == TransactionState::Active, Ordering::Release);
    }

    // ------------------------------------------------------------------
    // Shared observers
    // ------------------------------------------------------------------

    /// Current transaction state.
    #[inline]
    pub fn transaction(&self) -> TransactionState {
        if self.active.load(Ordering::Acquire) {
            TransactionState::Active
        } else {
            TransactionState::Idle
        }
    }

    /// Get the current write head index.
    ///
    /// The consumer snapshots this to bound a scan.
    #[inline]
    pub fn write_head(&self) -> u32 {
        self.write_idx.load(Ordering::Acquire)
    }

    /// Get the current read index.
    #[inline]
    pub fn read_head(&self) -> u32 {
        self.read_idx.load(Ordering::Acquire)
    }

    /// Number of captured symbols not yet consumed.
    #[inline]
    pub fn pending(&self) -> u32 {
        self.write_head().wrapping_sub(self.read_head())
    }

    /// Total symbols dropped because the ring was full.
    #[inline]
    pub fn overflows(&self) -> u32 {
        self.overflows.load(Ordering::Relaxed)
    }

    /// Get the buffer capacity.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    // ------------------------------------------------------------------
    // Consumer side (poll loop only)
    // ------------------------------------------------------------------

    /// Read the symbol at `idx` without consuming it.
    ///
    /// Returns `None` if `idx` is outside the unread region.
    #[inline]
    pub fn peek(&self, idx: u32) -> Option<Symbol> {
        let write = self.write_idx.load(Ordering::Acquire);
        let read = self.read_idx.load(Ordering::Relaxed);

        if idx.wrapping_sub(read) >= write.wrapping_sub(read) {
            return None;
        }

        // SAFETY: idx is inside read..write, the producer will not touch it
        Some(unsafe { (*self.slots.get())[(idx as usize) & Self::MASK] })
    }

    /// Mark every symbol before `idx` as consumed.
    ///
    /// `idx` must lie within `read_head()..=write_head()`.
    #[inline]
    pub fn consume_to(&self, idx: u32) {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        debug_assert!(idx.wrapping_sub(read) <= write.wrapping_sub(read));
        self.read_idx.store(idx, Ordering::Release);
    }

    /// True when the producer is idle, has not advanced past `snapshot`,
    /// and everything up to `snapshot` has been consumed.
    ///
    /// This is the only state in which the consumer may discard partial
    /// session data: no symbol can be in flight.
    #[inline]
    pub fn is_quiescent(&self, snapshot: u32) -> bool {
        self.transaction() == TransactionState::Idle
            && self.write_head() == snapshot
            && self.read_head() == snapshot
    }
}

impl<const N: usize> Default for CaptureBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_basic_write_read() {
        let buffer = CaptureBuffer::<64>::new();

        assert!(buffer.push(Symbol::Start));
        assert!(buffer.push(Symbol::bit(true)));

        assert_eq!(buffer.peek(0), Some(Symbol::Start));
        assert_eq!(buffer.peek(1), Some(Symbol::bit(true)));
        assert_eq!(buffer.peek(2), None);
        assert_eq!(buffer.pending(), 2);
    }

    #[test]
    fn test_capture_consume() {
        let buffer = CaptureBuffer::<64>::new();
        for _ in 0..10 {
            buffer.push(Symbol::bit(false));
        }

        buffer.consume_to(6);
        assert_eq!(buffer.pending(), 4);
        assert_eq!(buffer.peek(5), None);
        assert!(buffer.peek(6).is_some());
    }

    #[test]
    fn test_capture_drop_new_on_full() {
        let buffer = CaptureBuffer::<4>::new();

        assert!(buffer.push(Symbol::Start));
        assert!(buffer.push(Symbol::bit(true)));
        assert!(buffer.push(Symbol::bit(false)));

        // Full: newest is dropped and leaves a gap behind the last kept one
        assert!(!buffer.push(Symbol::bit(true)));
        assert!(!buffer.push(Symbol::Stop));
        assert_eq!(buffer.overflows(), 2);
        assert_eq!(buffer.pending(), 4);
        assert_eq!(buffer.peek(0), Some(Symbol::Start));
        assert_eq!(buffer.peek(2), Some(Symbol::bit(false)));
        assert_eq!(buffer.peek(3), Some(Symbol::Gap));
    }

    #[test]
    fn test_capture_gap_per_overflow() {
        let buffer = CaptureBuffer::<4>::new();
        for _ in 0..3 {
            buffer.push(Symbol::bit(true));
        }
        assert!(!buffer.push(Symbol::Stop));

        // Consumer frees two slots, the producer fills and overflows again
        buffer.consume_to(2);
        assert!(buffer.push(Symbol::Start));
        assert!(!buffer.push(Symbol::bit(false)));

        assert_eq!(buffer.peek(2), Some(Symbol::bit(true)));
        assert_eq!(buffer.peek(3), Some(Symbol::Gap));
        assert_eq!(buffer.peek(4), Some(Symbol::Start));
        assert_eq!(buffer.peek(5), Some(Symbol::Gap));
        assert_eq!(buffer.overflows(), 2);
    }

    #[test]
    fn test_capture_wraps_after_consume() {
        let buffer = CaptureBuffer::<4>::new();
        for _ in 0..3 {
            buffer.push(Symbol::bit(false));
        }
        buffer.consume_to(3);

        assert!(buffer.push(Symbol::Start));
        assert_eq!(buffer.peek(3), Some(Symbol::Start));
        assert_eq!(buffer.overflows(), 0);
    }

    #[test]
    fn test_capture_quiescence() {
        let buffer = CaptureBuffer::<16>::new();
        buffer.set_transaction(TransactionState::Active);
        buffer.push(Symbol::Start);

        let snapshot = buffer.write_head();
        buffer.consume_to(snapshot);
        assert!(!buffer.is_quiescent(snapshot));

        buffer.set_transaction(TransactionState::Idle);
        assert!(buffer.is_quiescent(snapshot));

        // Producer moved on after the snapshot
        buffer.push(Symbol::Start);
        assert!(!buffer.is_quiescent(snapshot));
    }

    #[test]
    fn test_capture_concurrent_producer() {
        use std::sync::Arc;
        use std::thread;

        let buffer = Arc::new(CaptureBuffer::<64>::new());
        let producer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                let mut sent = 0u32;
                while sent < 1000 {
                    if buffer.push(Symbol::bit(sent % 3 == 0)) {
                        sent += 1;
                    }
                }
            })
        };

        let mut received = 0u32;
        while received < 1000 {
            let head = buffer.write_head();
            let mut idx = buffer.read_head();
            while idx != head {
                // Retried pushes leave gaps, the bits around them stay in order
                if buffer.peek(idx) != Some(Symbol::Gap) {
                    assert_eq!(buffer.peek(idx), Some(Symbol::bit(received % 3 == 0)));
                    received += 1;
                }
                idx = idx.wrapping_add(1);
            }
            buffer.consume_to(idx);
        }

        producer.join().unwrap();
        assert_eq!(buffer.pending(), 0);
    }
}
