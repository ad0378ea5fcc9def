//! Layer 2: Math
//!
//! ## Purpose
//!
//! This layer provides the geometric building blocks: the distance policy
//! that defines what "within the radius" means, and the KD-tree that answers
//! radius queries without rescanning every record.
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
//! Layer 2: Math ← You are here
//!   ↓
//! Layer 1: Primitives
//! ```

/// Neighborhood distance policy (circular or square).
pub mod distance;

/// 2-D KD-tree with radius queries.
pub mod neighborhood;
