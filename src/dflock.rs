//! The dflock state machine: bin assignment, the acquire/release protocol,
//! and the fixed-size bin array that backs both.

use crate::atomics::{fence_acquire, fence_full, fence_release, spin_loop, AtomicU32, Ordering};
use crate::bin::Bin;
use crate::error::DfLockError;
use crate::time::Clock;

/// Number of priority bins. Fixed by the width of the `occupied_bins`
/// bitmap so occupancy fits a single atomic word and the release-time scan
/// is trivially bounded; see the crate's Open Question notes for why this
/// is not a const generic.
pub const BIN_COUNT: u32 = 32;

/// A deadline-aware mutual-exclusion lock.
///
/// `DfLock` hands the global lock to exactly one thread at a time, chosen
/// earliest-deadline-first among the threads currently waiting, using a
/// fixed set of [`BIN_COUNT`] priority bins rather than a sorted waiter
/// list. See the crate root docs for the full protocol.
///
/// # Example
///
/// ```
/// use dflock::{DfLock, time::AtomicTickClock};
///
/// let lock = DfLock::new(1000, AtomicTickClock::new()).unwrap();
/// lock.lock(0);
/// // ... critical section ...
/// lock.unlock();
/// ```
pub struct DfLock<C: Clock> {
    /// Width of one bin in time units. `round_size = bin_granularity *
    /// BIN_COUNT` is the period the bin ring covers.
    bin_granularity: u32,
    /// Bit *i* set iff `bins[i]` has at least one thread attached (holder
    /// or waiter).
    occupied_bins: AtomicU32,
    /// Index of the bin whose thread currently owns the global lock. Only
    /// meaningful while the lock is held; see `DfLock::new`'s doc comment
    /// on why this is an atomic rather than a plain field.
    last_used_bin: AtomicU32,
    bins: [Bin; BIN_COUNT as usize],
    clock: C,
}

impl<C: Clock> DfLock<C> {
    /// Construct a lock with the given bin width (in the same units as the
    /// deadlines passed to `lock` and the ticks `clock` produces) and time
    /// source.
    ///
    /// Fails if `granularity` is zero, or if `granularity as u64 *
    /// BIN_COUNT as u64` would not fit a `u64` (see the crate's Open
    /// Question notes — in practice unreachable for a `u32` granularity,
    /// but checked rather than assumed).
    pub fn new(granularity: u32, clock: C) -> Result<Self, DfLockError> {
        if granularity == 0 {
            return Err(DfLockError::ZeroGranularity);
        }
        if (granularity as u64).checked_mul(BIN_COUNT as u64).is_none() {
            return Err(DfLockError::RoundSizeOverflow);
        }

        let lock = Self {
            bin_granularity: granularity,
            occupied_bins: AtomicU32::new(0),
            last_used_bin: AtomicU32::new(0),
            bins: core::array::from_fn(|_| Bin::new()),
            clock,
        };

        log::debug!(
            "dflock: constructed with bin_granularity={granularity}, round_size={}",
            lock.round_size()
        );

        fence_full();
        Ok(lock)
    }

    /// `bin_granularity * BIN_COUNT`: the period the bin ring covers.
    #[inline]
    fn round_size(&self) -> u64 {
        self.bin_granularity as u64 * BIN_COUNT as u64
    }

    /// Maps a point in time to the bin whose span it falls in.
    #[inline]
    fn bin_of(&self, t: u64) -> u32 {
        ((t % self.round_size()) / self.bin_granularity as u64) as u32
    }

    /// Pure, side-effect-free bin lookup for a deadline, with no reference
    /// to "now" — this is the crate's public bin-assignment primitive, used
    /// by callers that want to reason about where a deadline lands without
    /// going through `lock`. It is not what `lock` itself uses to choose an
    /// insertion bin; see `insert_bin`.
    #[inline]
    pub fn compute_bin(&self, deadline: u64) -> u32 {
        self.bin_of(deadline)
    }

    /// Chooses which bin a newly arriving waiter with deadline `deadline`
    /// attaches to, given the current time.
    ///
    /// - A deadline already in the past goes in the most-immediate bin
    ///   (`bin_of(now)`).
    /// - A deadline more than one round out goes in the bin one step
    ///   *behind* now — the farthest-future slot in the ring, since the
    ///   release-time scan starts at `bin_of(now)` and wraps forward.
    /// - Otherwise the deadline's own bin.
    fn insert_bin(&self, deadline: u64) -> u32 {
        let now = self.clock.now();

        if now >= deadline {
            self.bin_of(now)
        } else if deadline - now > self.round_size() {
            (self.bin_of(now) + BIN_COUNT - 1) % BIN_COUNT
        } else {
            self.bin_of(deadline)
        }
    }

    /// Release-time successor selection: the first occupied bin at or
    /// after `bin_of(now)`, wrapping. `None` if no bin is occupied.
    fn next_bin(&self) -> Option<u32> {
        let occupied = self.occupied_bins.load(Ordering::Acquire);
        if occupied == 0 {
            return None;
        }

        let start = self.bin_of(self.clock.now());
        for offset in 0..BIN_COUNT {
            let candidate = (start + offset) % BIN_COUNT;
            if occupied & (1 << candidate) != 0 {
                return Some(candidate);
            }
        }

        // occupied != 0 guarantees some bit is set within the scan above.
        unreachable!("occupied_bins was nonzero but no bit was found in a full scan")
    }

    /// Acquire the global lock, registering `deadline` as this waiter's
    /// scheduling hint. Blocks until this thread holds the lock.
    pub fn lock(&self, deadline: u64) {
        let bin_index = self.insert_bin(deadline);
        let bin = &self.bins[bin_index as usize];

        bin.contention_count.fetch_add(1, Ordering::Release);
        bin.spinlock.lock();
        bin.contention_count.fetch_sub(1, Ordering::Relaxed);

        // Set our bin's occupied bit, remembering whether we made the
        // 0 -> nonzero transition (the lock was idle).
        let mut prev = self.occupied_bins.load(Ordering::Relaxed);
        loop {
            let updated = prev | (1 << bin_index);
            match self.occupied_bins.compare_exchange_weak(
                prev,
                updated,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => prev = actual,
            }
        }
        fence_acquire();

        if prev == 0 {
            // We were the idle-to-occupied transition: the lock was free,
            // so we own it immediately.
            bin.active.store(1, Ordering::Relaxed);
            log::trace!("dflock: bin {bin_index} claimed the lock immediately");
        } else {
            log::trace!("dflock: bin {bin_index} waiting to be activated");
            while bin.active.load(Ordering::Acquire) == 0 {
                spin_loop();
            }
        }

        self.last_used_bin.store(bin_index, Ordering::Relaxed);
        fence_release();
    }

    /// Release the global lock. Caller must currently hold it (i.e. have
    /// returned from a matching `lock` call with no intervening `unlock`).
    /// Activates the next occupied bin's waiter as the new owner, which may
    /// be this same bin if another thread is still waiting on it.
    pub fn unlock(&self) {
        let bin_index = self.last_used_bin.load(Ordering::Relaxed);
        let bin = &self.bins[bin_index as usize];

        #[cfg(debug_assertions)]
        debug_assert!(
            bin.is_active(),
            "DfLock::unlock called but last_used_bin {bin_index} was not active"
        );

        bin.active.store(0, Ordering::Relaxed);
        fence_release();

        // If no one else is waiting at this bin, it can go back to idle.
        // A thread that arrives between this check and the spinlock unlock
        // below is still blocked on the spinlock and will re-set the bit
        // itself once it gets in (see the crate's Open Question notes).
        if bin.contention() == 0 {
            self.occupied_bins
                .fetch_and(!(1 << bin_index), Ordering::Relaxed);
        }

        bin.spinlock.unlock();

        match self.next_bin() {
            Some(next) if next != bin_index => {
                self.bins[next as usize].active.store(1, Ordering::Relaxed);
                log::trace!("dflock: handed off from bin {bin_index} to bin {next}");
            }
            Some(next) => {
                // Same bin reselected: contention_count was nonzero, so a
                // waiter is already past the spinlock and spinning on
                // `active` in its own lock() call. Re-arm it here, or it
                // waits forever (no other bin is occupied to trigger a
                // cross-bin handoff later).
                self.bins[next as usize].active.store(1, Ordering::Relaxed);
                log::trace!("dflock: bin {bin_index} reselected itself");
            }
            None => {
                log::debug!("dflock: bin {bin_index} released with no waiters");
            }
        }

        fence_full();
    }
}
