//! Layer 1: Primitives
//!
//! ## Purpose
//!
//! This layer provides the building blocks every other layer depends on:
//! the error taxonomy, the columnar record table and the cancellation token
//! checked by the engine between chunks.
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
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives ← You are here
//! ```

/// Cooperative cancellation and deadlines.
pub mod cancel;

/// Error types.
pub mod errors;

/// Columnar record table.
pub mod table;
