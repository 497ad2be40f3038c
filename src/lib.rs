//! `dflock`: a deadline-aware, constant-space mutual-exclusion lock.
//!
//! A dflock has unique-owner semantics (one holder at a time, like any
//! mutex) but its scheduling discipline is earliest-deadline-first among
//! waiting threads rather than FIFO or unordered: a caller supplies a
//! deadline when acquiring, and among threads currently contending for the
//! lock, the one whose deadline is soonest tends to be handed the lock
//! first. It does this in constant space — a fixed set of [`BIN_COUNT`]
//! priority bins, no per-acquisition allocation, no sorted waiter list —
//! by hashing each deadline to a bin and letting bin occupancy (tracked in
//! a single atomic bitmap) drive a wrap-scan at release time.
//!
//! This is not a reader/writer lock, is not reentrant, and does not enforce
//! deadlines: missing one is not an error, only a scheduling hint that
//! degrades gracefully.
//!
//! # Example
//!
//! ```
//! use dflock::{DfLock, time::AtomicTickClock};
//!
//! // granularity is in the same units as the deadlines passed to lock().
//! let lock = DfLock::new(1_000, AtomicTickClock::new())?;
//!
//! lock.lock(500); // "I'd like the lock by tick 500"
//! // ... critical section ...
//! lock.unlock();
//! # Ok::<(), dflock::DfLockError>(())
//! ```

#![no_std]
#![warn(missing_docs)]
#![allow(clippy::needless_doctest_main)]

pub mod atomics;
pub mod spinlock;
pub mod time;

mod bin;
mod dflock;
mod error;

pub use crate::dflock::{DfLock, BIN_COUNT};
pub use crate::error::DfLockError;
