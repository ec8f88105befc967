//! Per-file and project semantic models.
//!
//! This crate turns a bound, checked file into a queryable semantic model:
//! every interesting node mapped to a symbol, an inferred type, and a
//! confidence level. The project model federates per-file models, owns the
//! call-site registry, and schedules cross-method return inference with a
//! cycle detector.

pub mod collector;
pub mod cycles;
pub mod model;
pub mod project;
pub mod refs;
pub mod registry;

pub use cycles::{CycleDetector, ScheduledMethod};
pub use model::{SemanticModel, TypeDiff};
pub use project::{ProjectModel, ProjectReference};
pub use refs::{Confidence, Reference};
pub use registry::{CallSite, CallSiteRegistry};
