//! Layer 3: Algorithms
//!
//! ## Purpose
//!
//! This layer turns a neighborhood (a set of row indices) into ecological
//! metrics: species richness, observation density, site density and
//! richness weighted by sampling effort.
//!
//! ## Architecture
//!
//! ```text
//! Layer 6: API
//!   ↓
//! Layer 5: Adapters
//!   ↓
//! Layer 4: Engine
//!   ↓
//! Layer 3: Algorithms ← You are here
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Metric names, selections and per-record results.
pub mod metrics;

/// Neighborhood-to-metrics reduction.
pub mod reducer;
