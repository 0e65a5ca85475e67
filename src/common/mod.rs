//! Common utilities shared across the simulator.
//!
//! Provides the fixed-width bit-vector type carried on the wires, the
//! ordered `0/1/X` truth table used by every decode stage, and the engine
//! error type.

/// Fixed-width bit vectors.
pub mod bits;

/// Engine error types.
pub mod error;

/// Ordered pattern-matching truth tables.
pub mod truth;

pub use bits::Bits;
pub use error::SimError;
pub use truth::TruthTable;
