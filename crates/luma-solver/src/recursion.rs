//! Depth bounding for recursive type computations.
//!
//! Cycle detection is handled by the relation cache's in-progress states;
//! what remains is keeping legitimately deep recursions from overflowing
//! the stack. [`RecursionProfile`] names the limits so call sites say what
//! they are guarding instead of passing magic numbers.

/// Named recursion limit presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// Relation checking: deep structural comparison of recursive types.
    ///
    /// Needs the deepest structural limit because comparison of recursive
    /// types can legitimately nest far before a cycle key repeats.
    RelationCheck,

    /// Lazy definition resolution: following alias and interface
    /// indirections to a structural body.
    LazyResolution,
}

impl RecursionProfile {
    /// Maximum recursion depth for this profile.
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::RelationCheck => 100,
            Self::LazyResolution => 50,
        }
    }
}

/// A lightweight depth counter for stack overflow protection.
///
/// No key tracking: the same pair may be legitimately revisited (the
/// relation cache handles cycles), only nesting depth needs bounding.
pub struct DepthCounter {
    depth: u32,
    max_depth: u32,
    exceeded: bool,
}

impl DepthCounter {
    pub fn new(max_depth: u32) -> Self {
        Self {
            depth: 0,
            max_depth,
            exceeded: false,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth())
    }

    /// Try to enter a deeper level. Returns `false` (and sets the sticky
    /// exceeded flag, without incrementing) when the limit is reached; do
    /// not call `leave()` in that case.
    #[inline]
    pub fn enter(&mut self) -> bool {
        if self.depth >= self.max_depth {
            self.exceeded = true;
            return false;
        }
        self.depth += 1;
        true
    }

    #[inline]
    pub fn leave(&mut self) {
        debug_assert!(
            self.depth > 0,
            "DepthCounter::leave() called at depth 0 (underflow)"
        );
        self.depth = self.depth.saturating_sub(1);
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Sticky until [`reset()`](Self::reset); callers use it to bail out
    /// early and to emit depth diagnostics once.
    #[inline]
    pub fn is_exceeded(&self) -> bool {
        self.exceeded
    }

    pub fn reset(&mut self) {
        self.depth = 0;
        self.exceeded = false;
    }
}

#[cfg(debug_assertions)]
impl Drop for DepthCounter {
    fn drop(&mut self) {
        if !std::thread::panicking() && self.depth > 0 {
            panic!(
                "DepthCounter dropped at depth {} (leaked enter() calls)",
                self.depth
            );
        }
    }
}

#[cfg(test)]
#[path = "../tests/recursion_tests.rs"]
mod tests;
