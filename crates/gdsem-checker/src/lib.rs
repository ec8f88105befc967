//! Flow-sensitive type inference for the gdsem semantic analyzer.
//!
//! This crate provides:
//! - `FlowState` - per-program-point variable type information
//! - `FlowAnalyzer` - intraprocedural abstract interpretation of one method
//!   body, with fixed-point iteration for loops
//! - `NarrowingMap` - branch-sensitive type narrowing from guard conditions
//! - `CheckerContext` - the expression type inference engine and its caches
//! - Parameter usage fingerprinting and duck-type resolution
//! - Container usage profiles and return type collection

pub mod containers;
pub mod context;
pub mod flow;
pub mod flow_state;
pub mod infer;
pub mod narrowing;
pub mod param_resolver;
pub mod params;
pub mod returns;

pub use containers::{ContainerUsageProfile, UsageKind};
pub use context::{AnalysisArtifacts, CallSiteOracle, CheckerContext, MethodFlow, MethodKey};
pub use flow::FlowAnalyzer;
pub use flow_state::{FlowState, FlowType, TerminationKind};
pub use narrowing::{NarrowedEntry, NarrowingMap};
pub use param_resolver::{InferenceConfidence, InferredType};
pub use params::ParameterConstraints;
