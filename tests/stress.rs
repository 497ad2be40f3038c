//! Multithreaded regression tests.
//!
//! These stand in for the "regression harness spawning worker threads" the
//! crate's own protocol treats as an external collaborator: the harness
//! here is just `std::thread`, used the way any ordinary Rust integration
//! test would, exercising `dflock` as a black box the way an application
//! embedding it would.

use dflock::time::AtomicTickClock;
use dflock::DfLock;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// A clock driven by wall-clock time, for tests where threads need "now"
/// to actually advance on its own rather than being pinned by hand.
struct WallClock {
    start: Instant,
}

impl WallClock {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl dflock::time::Clock for WallClock {
    fn now(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

#[test]
fn contention_stress_many_threads_many_iterations() {
    // 16 threads, 10_000 iterations each, two-threads-per-bin granularity,
    // using a pinned clock so the stress run finishes in well under a
    // second rather than depending on wall time.
    const THREADS: u64 = 16;
    const ITERATIONS: u64 = 10_000;

    let lock = Arc::new(DfLock::new(2, AtomicTickClock::new()).unwrap());
    let counter = Arc::new(AtomicU32::new(0));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let lock = Arc::clone(&lock);
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                for i in 0..ITERATIONS {
                    let deadline = t.wrapping_mul(31).wrapping_add(i);
                    lock.lock(deadline);
                    let before = counter.fetch_add(1, Ordering::SeqCst);
                    assert_eq!(
                        before, 0,
                        "observed another holder inside the critical section"
                    );
                    counter.fetch_sub(1, Ordering::SeqCst);
                    lock.unlock();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn no_deadlock_arbitrary_deadlines() {
    // N threads, M acquire/release pairs each, arbitrary (including
    // wrapping and zero) deadlines: all calls must return.
    const THREADS: u64 = 12;
    const ITERATIONS: u64 = 2_000;

    let lock = Arc::new(DfLock::new(7, AtomicTickClock::new()).unwrap());

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                for i in 0..ITERATIONS {
                    let deadline = match i % 4 {
                        0 => 0,
                        1 => t * i,
                        2 => u64::MAX - i,
                        _ => i.wrapping_mul(t + 1),
                    };
                    lock.lock(deadline);
                    lock.unlock();
                }
            })
        })
        .collect();

    let deadline = Instant::now() + Duration::from_secs(30);
    for h in handles {
        assert!(
            Instant::now() < deadline,
            "a worker thread failed to finish in time, suspected deadlock"
        );
        h.join().unwrap();
    }
}

#[test]
fn real_clock_end_to_end() {
    // Exercises the lock with a genuinely advancing clock rather than a
    // pinned one, so insert_bin and next_bin see a moving "now" across
    // concurrent acquisitions, the way a real embedding would.
    let lock = Arc::new(DfLock::new(1_000, WallClock::new()).unwrap());
    let counter = Arc::new(AtomicU32::new(0));

    let handles: Vec<_> = (0..8u64)
        .map(|t| {
            let lock = Arc::clone(&lock);
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                for _ in 0..500 {
                    let deadline = t * 1_000;
                    lock.lock(deadline);
                    let before = counter.fetch_add(1, Ordering::SeqCst);
                    assert_eq!(before, 0);
                    counter.fetch_sub(1, Ordering::SeqCst);
                    lock.unlock();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn no_lost_wakeups() {
    // Every lock() call that has to block (because the lock was already
    // held) must eventually return once some thread unlocks. Run a
    // two-thread ping-pong long enough that a lost wakeup would hang the
    // test rather than merely slow it down.
    let lock = Arc::new(DfLock::new(4, AtomicTickClock::new()).unwrap());
    let handoffs = Arc::new(AtomicU32::new(0));
    const ROUNDS: u32 = 5_000;

    let handles: Vec<_> = (0..4u64)
        .map(|t| {
            let lock = Arc::clone(&lock);
            let handoffs = Arc::clone(&handoffs);
            thread::spawn(move || {
                for i in 0..ROUNDS {
                    lock.lock(t + i as u64);
                    handoffs.fetch_add(1, Ordering::SeqCst);
                    lock.unlock();
                }
            })
        })
        .collect();

    let deadline = Instant::now() + Duration::from_secs(30);
    for h in handles {
        assert!(Instant::now() < deadline, "suspected lost wakeup: a thread never resumed");
        h.join().unwrap();
    }
    assert_eq!(handoffs.load(Ordering::SeqCst), ROUNDS * 4);
}
