//! Centralized limits and thresholds for the semantic analyzer.
//!
//! This module provides shared constants for recursion depths and iteration
//! bounds used throughout the codebase. Centralizing these values prevents
//! duplicate definitions with inconsistent values and documents the rationale
//! for each limit.
//!
//! Every bounded loop in the core guarantees termination through one of the
//! constants below; none of them surfaces as an error when hit - analysis
//! stops with whatever result has accumulated.

/// Maximum number of fixed-point iterations over a loop body.
///
/// Flow analysis re-enters `for`/`while` bodies until the accumulated
/// variable type sets stop growing. Monotonic union growth converges fast in
/// practice; the bound caps pathological cases (e.g. a loop that keeps
/// producing new generic instantiations through reassignment).
pub const MAX_LOOP_FIXPOINT_ITERATIONS: u32 = 10;

/// Maximum recursion depth for expression type inference.
///
/// The inference engine recurses over nested expressions and through
/// method-return lookups. Together with the in-progress set this breaks
/// cross-method cycles; when exceeded, inference yields `Variant`.
pub const MAX_INFER_DEPTH: u32 = 50;

/// Maximum number of scopes walked when resolving a name upward.
///
/// Scope chains are shallow (class > method > nested lambdas/blocks); the
/// bound protects against a corrupted parent chain in a malformed tree.
pub const MAX_SCOPE_WALK_ITERATIONS: usize = 10_000;

/// Maximum number of base-class hops when walking an inheritance chain.
///
/// Guards against base-type cycles in runtime provider data; the walk keeps
/// a visited set as well, this is the belt to that suspenders.
pub const MAX_BASE_CHAIN_HOPS: usize = 64;

/// Maximum number of parent hops when walking up the AST.
///
/// Parent backrefs are arena indices; a malformed tree could in principle
/// form a parent cycle. Upward walks (scope discovery, narrowing context
/// lookup) stop after this many hops.
pub const MAX_PARENT_HOPS: usize = 4_096;

/// Maximum number of assignment hops followed when tracing a string constant
/// back to its literal for reflection-style reference tracking.
pub const MAX_CONSTANT_TRACE_HOPS: usize = 16;
