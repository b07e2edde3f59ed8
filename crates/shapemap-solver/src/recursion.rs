//! Depth and work limits for recursive plan resolution.
//!
//! The plan registry already breaks cycles (a re-entered pair resolves to its
//! in-progress shell), so the only thing left to guard is nesting depth on
//! very deep but acyclic graphs and the total amount of work per mapper.
//!
//! # Profiles
//!
//! [`RecursionProfile`] provides named presets so call sites don't carry
//! magic numbers:
//!
//! ```ignore
//! let counter = DepthCounter::with_profile(RecursionProfile::PlanResolution);
//! ```

use shapemap_common::limits;

/// Named recursion limit presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// Builder chain recursion (element, member, key/value and derived arms).
    ///
    /// depth = 128, iterations = 100,000
    PlanResolution,

    /// Custom limits for one-off or test scenarios.
    Custom { max_depth: u32, max_iterations: u32 },
}

impl RecursionProfile {
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::PlanResolution => limits::MAX_PLAN_DEPTH,
            Self::Custom { max_depth, .. } => max_depth,
        }
    }

    pub const fn max_iterations(self) -> u32 {
        match self {
            Self::PlanResolution => limits::MAX_PLAN_RESOLUTIONS,
            Self::Custom { max_iterations, .. } => max_iterations,
        }
    }
}

/// Result of attempting to enter one more level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    Entered,
    DepthExceeded,
    IterationExceeded,
}

impl RecursionResult {
    #[inline]
    pub fn is_entered(self) -> bool {
        matches!(self, Self::Entered)
    }
}

/// A depth counter with a total work budget.
///
/// Unlike a visiting-set guard it does not detect cycles; the same pair may
/// legitimately be resolved several times under different configurations.
///
/// # Usage
///
/// ```ignore
/// if !counter.enter().is_entered() {
///     return None; // report and bail
/// }
/// let result = resolve();
/// counter.leave();
/// ```
#[derive(Debug)]
pub struct DepthCounter {
    depth: u32,
    iterations: u32,
    max_depth: u32,
    max_iterations: u32,
    exceeded: bool,
}

impl DepthCounter {
    pub fn new(max_depth: u32, max_iterations: u32) -> Self {
        Self {
            depth: 0,
            iterations: 0,
            max_depth,
            max_iterations,
            exceeded: false,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth(), profile.max_iterations())
    }

    /// Try to enter a deeper level. On success the caller must call
    /// [`leave`](Self::leave).
    pub fn enter(&mut self) -> RecursionResult {
        self.iterations = self.iterations.saturating_add(1);
        if self.iterations > self.max_iterations {
            self.exceeded = true;
            return RecursionResult::IterationExceeded;
        }
        if self.depth >= self.max_depth {
            self.exceeded = true;
            return RecursionResult::DepthExceeded;
        }
        self.depth += 1;
        RecursionResult::Entered
    }

    pub fn leave(&mut self) {
        debug_assert!(
            self.depth > 0,
            "DepthCounter::leave() called at depth 0. \
             This indicates a leave without a matching enter()."
        );
        self.depth = self.depth.saturating_sub(1);
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    #[inline]
    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    #[inline]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Sticky: stays `true` once any limit was hit.
    #[inline]
    pub fn is_exceeded(&self) -> bool {
        self.exceeded
    }
}

#[cfg(debug_assertions)]
impl Drop for DepthCounter {
    fn drop(&mut self) {
        if !std::thread::panicking() && self.depth > 0 {
            panic!(
                "DepthCounter dropped with depth {}. \
                 This indicates leaked enter() calls without matching leave() calls.",
                self.depth,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_limit_is_enforced() {
        let mut counter = DepthCounter::new(2, 100);
        assert!(counter.enter().is_entered());
        assert!(counter.enter().is_entered());
        assert_eq!(counter.enter(), RecursionResult::DepthExceeded);
        assert!(counter.is_exceeded());
        counter.leave();
        counter.leave();
        assert_eq!(counter.depth(), 0);
    }

    #[test]
    fn test_iteration_budget_is_enforced() {
        let mut counter = DepthCounter::new(10, 3);
        for _ in 0..3 {
            assert!(counter.enter().is_entered());
            counter.leave();
        }
        assert_eq!(counter.enter(), RecursionResult::IterationExceeded);
    }

    #[test]
    fn test_plan_resolution_profile_uses_shared_limits() {
        let counter = DepthCounter::with_profile(RecursionProfile::PlanResolution);
        assert_eq!(counter.max_depth(), limits::MAX_PLAN_DEPTH);
    }
}
