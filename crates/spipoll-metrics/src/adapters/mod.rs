//! Layer 5: Adapters
//!
//! ## Purpose
//!
//! This layer provides execution adapters: how a validated configuration is
//! turned into a run over actual data. Batch processing of a complete
//! in-memory table is the supported mode.
//!
//! ## Architecture
//!
//! ```text
//! Layer 6: API
//!   ↓
//! Layer 5: Adapters ← You are here
//!   ↓
//! Layer 4: Engine
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Whole-table batch processing.
pub mod batch;
