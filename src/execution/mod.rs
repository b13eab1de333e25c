//! Execution engine module.
//!
//! This module evaluates exported entry points on host buffers.

pub mod engine;

pub use engine::{ExecutionEngine, ExecutionOptions, ExecutionStats};
