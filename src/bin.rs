//! A single priority bin.
//!
//! Each `DfLock` holds a fixed array of `BIN_COUNT` of these. A thread
//! "attaches" to exactly one bin per acquisition (chosen by
//! `DfLock::insert_bin`), serializing with other threads at the same bin
//! through `spinlock` and signaling its presence to the rest of the lock
//! through `contention_count` and the lock's shared `occupied_bins` bitmap.

use crate::atomics::{AtomicU32, Ordering};
use crate::spinlock::FairSpinlock;

pub(crate) struct Bin {
    /// Serializes threads that hashed to this bin.
    pub(crate) spinlock: FairSpinlock,
    /// 1 iff the current holder of `spinlock` also holds the dflock's
    /// global lock. Single-writer at a time by construction: the releaser
    /// of the previously active bin clears its own `active` before a
    /// handoff ever sets another bin's `active`, so the two writers (a
    /// 0-to-nonzero acquirer, and a releaser choosing a successor) never
    /// race on the same bin.
    pub(crate) active: AtomicU32,
    /// Number of threads that have entered the acquire path for this bin
    /// and not yet acquired `spinlock`. Used at release time to decide
    /// whether the occupied bit can be cleared (see `DfLock::unlock`).
    /// Incremented with `Release` ordering so a releaser that reads it with
    /// `Acquire` (see `contention`) observes an arriving thread's increment
    /// as happening-before that thread's subsequent spinlock acquisition.
    pub(crate) contention_count: AtomicU32,
}

impl Bin {
    /// A fresh, unattached bin: unlocked, inactive, uncontended.
    pub(crate) const fn new() -> Self {
        Self {
            spinlock: FairSpinlock::new(),
            active: AtomicU32::new(0),
            contention_count: AtomicU32::new(0),
        }
    }

    #[inline]
    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed) != 0
    }

    #[inline]
    pub(crate) fn contention(&self) -> u32 {
        self.contention_count.load(Ordering::Acquire)
    }
}
