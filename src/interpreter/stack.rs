//! Native stack growth for the recursive evaluator.
//!
//! Script recursion is bounded by [`MAX_CALL_DEPTH`](super::MAX_CALL_DEPTH), but each
//! script frame costs several evaluator frames. Recursive entry points wrap their
//! bodies in [`ensure_sufficient_stack`] so the depth limit, not the host stack, is
//! what a deep program hits.

/// Grow when less than this remains.
const RED_ZONE: usize = 128 * 1024;

/// Size of each new stack segment.
const STACK_PER_RECURSION: usize = 2 * 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
