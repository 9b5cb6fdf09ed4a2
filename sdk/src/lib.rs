//! Forkcast SDK
//!
//! Shared types and errors for Forkcast components.
//! This crate is used by the engine library, the CLI and the integration tests.

/// Error types and handling
pub mod errors;

/// Dish, order and feedback records
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, ForkcastErrorExt};
pub use types::{Dietary, Dish, Feedback, Order, SpiceLevel};
