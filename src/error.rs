//! The one checked failure mode in this crate.
//!
//! Everything else — acquiring, releasing, computing a bin for a deadline —
//! is infallible at the API level (the protocol has no failure modes given
//! platform liveness); only constructing a `DfLock` with a bad granularity
//! is something a caller should be able to recover from rather than have
//! turned into a panic.

use core::fmt;

/// Why `DfLock::new` refused to construct a lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DfLockError {
    /// `bin_granularity` was zero. A zero-width bin makes `bin_of`
    /// divide by zero.
    ZeroGranularity,
    /// `bin_granularity as u64 * BIN_COUNT as u64` does not fit in a
    /// `u64`, so `round_size` would silently wrap rather than describe a
    /// real span of time.
    RoundSizeOverflow,
}

impl fmt::Display for DfLockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DfLockError::ZeroGranularity => write!(f, "bin_granularity must be greater than 0"),
            DfLockError::RoundSizeOverflow => {
                write!(f, "bin_granularity * BIN_COUNT overflows u64")
            }
        }
    }
}

impl core::error::Error for DfLockError {}
