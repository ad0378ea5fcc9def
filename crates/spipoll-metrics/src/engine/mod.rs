//! Layer 4: Engine
//!
//! ## Purpose
//!
//! This layer resolves neighborhoods against the spatial index, runs the
//! reducer for every record (in parallel when enabled), and assembles the
//! per-record results into output columns.
//!
//! ## Architecture
//!
//! ```text
//! Layer 6: API
//!   ↓
//! Layer 5: Adapters
//!   ↓
//! Layer 4: Engine ← You are here
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Parallel execution engine for the per-record metrics pass.
pub mod executor;

/// Result assembly and run summary.
pub mod output;

/// Point extraction and radius queries.
pub mod resolver;
