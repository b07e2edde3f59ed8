//! Centralized limits and thresholds for the mapping engine.
//!
//! Resolution is recursive descent over the type graph. Cycles are broken by
//! the plan registry, so these limits only bound pathological but acyclic
//! graphs (deep generic nesting, very long flattened names).

/// Maximum nesting depth of plan resolution.
///
/// Every strategy that requests a sub-plan (element, member, key/value,
/// derived arm) adds one level. Exceeding the limit reports a
/// depth diagnostic for the pair and resolves it as unmapped.
///
/// ```text
/// Order -> Lines: List<Line> -> Line -> Product -> Category -> ...
/// ```
pub const MAX_PLAN_DEPTH: u32 = 128;

/// Maximum total number of plan resolution attempts for one mapper.
///
/// Guards against combinatorial blowups when many configurations scope the
/// same type pairs differently.
pub const MAX_PLAN_RESOLUTIONS: u32 = 100_000;

/// Maximum number of split points considered when resolving a flattened
/// member name (`ManufacturerAddressStreetName` has three).
///
/// Names with more uppercase boundaries are still resolved, but only the first
/// `MAX_FLATTENING_SPLITS` boundaries are used as candidate split points.
pub const MAX_FLATTENING_SPLITS: usize = 16;
