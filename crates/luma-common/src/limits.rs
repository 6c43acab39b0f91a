//! Centralized limits and thresholds for the Luma type checker.
//!
//! This module provides shared constants for recursion depths, iteration
//! counts, and capacity limits used throughout the codebase. Centralizing
//! these values prevents duplicate definitions with inconsistent values and
//! documents the rationale for each limit.
//!
//! Solver recursion limits (relation checking, lazy type resolution) are
//! centralized in `luma_solver::recursion::RecursionProfile` rather than
//! here; the profiles are the single source of truth for solver recursion.

/// Maximum fixed-point iterations when analyzing a loop flow label.
///
/// Narrowing through a loop must account for types flowing around the back
/// edge. The analyzer re-walks the loop body until the type at the loop
/// header stops changing; pathological programs may never converge, so after
/// this many passes the analyzer gives up and widens conservatively.
///
/// ```text
/// let x: string | number = "start";
/// while (cond) {
///   use(x);      // loop header type must be stable
///   x = 1;       // back edge feeds number into the header
/// }
/// ```
pub const MAX_LOOP_ITERATIONS: u32 = 5;

/// Maximum flow nodes visited during one narrowing walk.
///
/// A single reference lookup walks the flow graph backward from its flow
/// node. Very large functions can produce graphs with hundreds of thousands
/// of nodes; this bounds the total work per query so one reference cannot
/// stall the whole check.
pub const MAX_FLOW_ANALYSIS_ITERATIONS: u32 = 100_000;

/// Maximum recursion depth for the backward flow walk.
///
/// The walk recurses once per antecedent edge. Straight-line code produces a
/// chain as long as the function body, so this is far larger than the
/// structural relation depth limit.
pub const MAX_FLOW_DEPTH: u32 = 10_000;

/// Maximum depth for expression type computation.
///
/// Deeply nested expressions each add a checker frame; past this depth the
/// checker bails out and returns the error type instead of overflowing the
/// stack.
pub const MAX_EXPR_CHECK_DEPTH: u32 = 500;

/// Inline capacity for flow node antecedent lists.
///
/// Almost every flow node has one antecedent; branch merge labels usually
/// have two. `SmallVec<[FlowNodeId; 2]>` keeps both common cases off the
/// heap.
pub const FLOW_ANTECEDENT_INLINE: usize = 2;

/// Inline capacity for type lists (union members, parameter lists).
///
/// Most unions in real code have fewer than 8 members, so
/// `SmallVec<[TypeId; 8]>` avoids allocation in the common case.
pub const TYPE_LIST_INLINE: usize = 8;

/// Maximum union members to show in diagnostic messages.
///
/// When displaying a type error involving a union, only the first N members
/// are printed; additional members are elided with `| ...` to keep messages
/// readable.
pub const UNION_MEMBER_DIAGNOSTIC_LIMIT: usize = 3;
