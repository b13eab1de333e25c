//! Core types for the pixkern kernel library.
//!
//! This module contains the foundational pieces every kernel is built from:
//! - Scalar types and values
//! - RGBA buffers and their axis descriptors
//! - Expression trees and boundary-extended sources
//! - Kernel and pipeline definitions
//! - Error types

pub mod types;
pub mod buffer;
pub mod expr;
pub mod boundary;
pub mod kernel;
pub mod error;

// Re-export commonly used types
pub use types::{Dim, ScalarType, ScalarValue};
pub use buffer::{BufferDim, RgbaBuffer, CHANNELS};
pub use expr::{BinaryOp, Expr, Sampler};
pub use boundary::{BoundaryPolicy, BoundedInput, ExtendedSource, Range, ResolvedRange};
pub use kernel::{BoundKernel, Kernel, Pipeline, Predicate, UpdateRule};
pub use error::{
    ExecutionError, ExportError, LayoutError, PixkernError, ScheduleError, ValidationError,
};
