//! Analysis configuration.
//!
//! This module lives in gdsem-common so that both the checker and the model
//! crates can reference `AnalysisOptions` without creating a circular
//! dependency.

use crate::limits;

/// Configuration for semantic analysis.
///
/// The defaults reproduce the reference behavior; front-ends may loosen the
/// iteration bounds for batch analysis or disable the second inference pass
/// for latency-sensitive queries.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisOptions {
    /// Bound on loop fixed-point iterations.
    pub max_loop_iterations: u32,
    /// Bound on inference recursion depth.
    pub max_infer_depth: u32,
    /// When true, methods whose return types participate in an inference
    /// cycle get a second pass that iterates the strongly connected
    /// component to a fixed point instead of staying at `Variant`.
    pub widen_cycle_returns: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            max_loop_iterations: limits::MAX_LOOP_FIXPOINT_ITERATIONS,
            max_infer_depth: limits::MAX_INFER_DEPTH,
            widen_cycle_returns: false,
        }
    }
}
