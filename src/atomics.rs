//! Atomic primitives and named memory fences.
//!
//! This module does not wrap `core::sync::atomic` behind a new type — the
//! types are re-exported as-is and used directly by `bin` and `dflock`. What
//! it adds is a small set of named fence helpers so call sites read as
//! intent ("the occupied bit is now visible before we read `active`") rather
//! than a bare `Ordering` chosen by habit.

pub use core::hint::spin_loop;
pub use core::sync::atomic::{fence, AtomicU32, Ordering};

/// Full barrier: nothing before may be reordered past it, nothing after may
/// be reordered before it. Used at the end of `DfLock::new` and at the end
/// of `DfLock::unlock`, after the successor has been handed the lock.
#[inline]
pub fn fence_full() {
    fence(Ordering::SeqCst);
}

/// Acquire fence: subsequent reads observe everything published before the
/// matching release. Used after the occupied-bit CAS in `acquire` and after
/// observing a bin's `active` flag flip to 1.
#[inline]
pub fn fence_acquire() {
    fence(Ordering::Acquire);
}

/// Release fence: prior writes are visible to any thread that later
/// observes the next release-ordered store. Used after storing
/// `last_used_bin` in `acquire` and after clearing `active` in `release`.
#[inline]
pub fn fence_release() {
    fence(Ordering::Release);
}
