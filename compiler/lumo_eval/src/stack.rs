//! Stack safety for deep script recursion.
//!
//! Every script call re-enters the dispatch loop on the native stack, so a
//! recursive script consumes native stack in proportion to its depth. The
//! call-depth limit bounds that; `stacker` makes sure the bound is reachable
//! on threads with small stacks.

/// Run `f`, growing the native stack first if less than the red zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    /// Minimum stack space to keep available (128KB red zone).
    const RED_ZONE: usize = 128 * 1024;

    /// Stack space to allocate when growing (2MB).
    const STACK_PER_SEGMENT: usize = 2 * 1024 * 1024;

    stacker::maybe_grow(RED_ZONE, STACK_PER_SEGMENT, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
