//! A fair (FIFO) spinlock.
//!
//! This is the "fair mutual-exclusion spinlock" collaborator a dflock bin
//! needs (see the crate's top-level docs): waiters take a ticket and spin
//! until their number comes up, so the thread that arrived first at a bin
//! is guaranteed to be served first. Unlike a guarded `Mutex`-style lock,
//! `FairSpinlock` protects no data of its own — a dflock bin's `active` and
//! `contention_count` fields live next to it as their own atomics, read and
//! written under the dflock acquire/release protocol rather than by this
//! lock.

use crate::atomics::{spin_loop, AtomicU32, Ordering};

/// Above this many spins on our ticket we assume something upstream is
/// stuck rather than merely busy, and panic instead of spinning forever
/// silently. Only checked in debug builds, matching how misuse elsewhere
/// in this crate is reported.
#[cfg(debug_assertions)]
const STUCK_SPIN_THRESHOLD: u32 = 50_000_000;

/// A ticket-based fair spinlock.
///
/// # Example
///
/// ```
/// use dflock::spinlock::FairSpinlock;
///
/// let lock = FairSpinlock::new();
/// lock.lock();
/// assert!(lock.is_locked());
/// lock.unlock();
/// ```
pub struct FairSpinlock {
    /// Next ticket to hand out.
    next_ticket: AtomicU32,
    /// Ticket currently being served.
    now_serving: AtomicU32,
}

impl FairSpinlock {
    /// Create a new, unlocked spinlock.
    pub const fn new() -> Self {
        Self {
            next_ticket: AtomicU32::new(0),
            now_serving: AtomicU32::new(0),
        }
    }

    /// Acquire the lock, blocking until this thread's ticket is served.
    ///
    /// FIFO among callers: the order tickets are handed out in is the order
    /// `lock` returns in.
    #[inline]
    pub fn lock(&self) {
        let my_ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);

        #[cfg(debug_assertions)]
        let mut spins = 0u32;

        while self.now_serving.load(Ordering::Acquire) != my_ticket {
            spin_loop();

            #[cfg(debug_assertions)]
            {
                spins = spins.wrapping_add(1);
                if spins > STUCK_SPIN_THRESHOLD {
                    panic!(
                        "FairSpinlock: ticket {} never served (now serving {})",
                        my_ticket,
                        self.now_serving.load(Ordering::Relaxed)
                    );
                }
            }
        }
    }

    /// Release the lock, serving the next ticket in line.
    ///
    /// Caller must currently hold the lock; unlocking an unheld lock is a
    /// programming error (checked in debug builds only, per the crate's
    /// error-handling policy).
    #[inline]
    pub fn unlock(&self) {
        #[cfg(debug_assertions)]
        debug_assert!(
            self.is_locked(),
            "FairSpinlock::unlock called on a lock with no outstanding holder"
        );
        self.now_serving.fetch_add(1, Ordering::Release);
    }

    /// Whether some thread currently holds the lock.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.now_serving.load(Ordering::Relaxed) != self.next_ticket.load(Ordering::Relaxed)
    }
}

impl Default for FairSpinlock {
    fn default() -> Self {
        Self::new()
    }
}
