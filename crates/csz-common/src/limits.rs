//! Centralized limits and thresholds for the semantic core.
//!
//! Solver recursion limits live in `csz_solver::recursion::RecursionProfile`;
//! the constants here cover the checker and capacity hints.

/// Maximum nesting of collection literals inside one another.
///
/// `[[[[...]]]]` deeper than this stops binding and leaves the inner literals
/// without a natural type instead of recursing further.
pub const MAX_LITERAL_NESTING_DEPTH: u32 = 256;

/// Maximum number of base types walked when flattening a member table.
///
/// Declarations come from arbitrary libraries; a cyclic base chain stops here.
pub const MAX_BASE_CHAIN_DEPTH: u32 = 64;

/// Maximum number of user-defined conversion operators considered per lookup.
pub const MAX_USER_DEFINED_CANDIDATES: usize = 64;

/// Inline capacity for per-literal element vectors.
pub const ELEMENT_INLINE_CAPACITY: usize = 8;

/// Largest array length the planner will pack into a metadata blob.
pub const MAX_METADATA_BLOB_BYTES: usize = 1 << 20;
