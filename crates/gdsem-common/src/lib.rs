//! Common types and utilities for the gdsem semantic analyzer.
//!
//! This crate provides foundational types used across all gdsem crates:
//! - String interning (`Atom`, `Interner`, `ShardedInterner`)
//! - Source spans (`Span`)
//! - Position/Range types and `LineMap` for line/column conversion
//! - Centralized limits and thresholds
//! - Analysis configuration (`AnalysisOptions`)

// String interning for identifier deduplication
pub mod interner;
pub use interner::{Atom, Interner, ShardedInterner};

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Centralized limits and thresholds
pub mod limits;

// Position/Range types for line/column source locations
pub mod position;
pub use position::{LineMap, Location, Position, Range};

// Analysis configuration
pub mod options;
pub use options::AnalysisOptions;
