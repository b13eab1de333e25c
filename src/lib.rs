//! # pixkern - Scheduled RGBA Image Kernels
//!
//! pixkern defines a small set of image kernels over 8-bit RGBA buffers as
//! expression trees with an explicit execution schedule, and exports each of
//! them as an entry point with a fixed argument order and buffer layout
//! contract.
//!
//! ## Features
//!
//! - **Kernels**: grayscale, contrast, channel split and 90/180/270 degree
//!   rotation, each defined per output coordinate
//! - **Boundary Policies**: repeat-edge and constant-exterior reads, so no
//!   kernel ever reads out of range
//! - **Schedules**: tiling, fusion, parallel and vectorized loops that never
//!   change results
//! - **Export Contract**: ordered arguments, channel-interleaved layout,
//!   C headers and JSON manifests
//! - **Reference Evaluator**: validates invocations at the host boundary and
//!   runs schedules on a rayon pool
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pixkern::prelude::*;
//!
//! let registry = KernelRegistry::with_builtins();
//! let entry = registry.create("contrast").unwrap();
//!
//! let image = image::open("input.png").unwrap().to_rgba8();
//! let engine = ExecutionEngine::new();
//! let outputs = host::apply(&engine, &entry, &image, &[("factor", 0.8f32.into())]).unwrap();
//! outputs[0].save("output.png").unwrap();
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: Scalars, buffers, expressions, boundary policies, kernels and errors
//! - [`schedule`]: Schedule directives and their lowering into work units
//! - [`export`]: Entry points, layout contracts, targets, headers and manifests
//! - [`validation`]: Host-boundary validation pipeline
//! - [`execution`]: Reference evaluator
//! - [`kernels`]: Built-in kernels and the entry-point registry
//! - [`host`]: Wrappers taking and returning `image::RgbaImage`
//! - [`config`]: TOML configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod execution;
pub mod export;
pub mod host;
pub mod kernels;
pub mod schedule;
pub mod validation;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use pixkern::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::buffer::{BufferDim, RgbaBuffer, CHANNELS};
    pub use crate::core::types::{Dim, ScalarType, ScalarValue};

    // Expressions and kernels
    pub use crate::core::boundary::{BoundaryPolicy, BoundedInput};
    pub use crate::core::expr::{cast, ch, clamp, max, min, param, sample, select, x, y, Expr};
    pub use crate::core::kernel::{Kernel, Pipeline, Predicate};

    // Errors
    pub use crate::core::error::{
        ExecutionError, ExportError, LayoutError, PixkernError, PixkernResult, ScheduleError,
        ValidationError, ValidationReport, ValidationWarning,
    };

    // Scheduling
    pub use crate::schedule::{Directive, ExecutionPlan, LoopVar, Schedule};

    // Export
    pub use crate::export::{
        emit_header, Argument, ArtifactPaths, EntryManifest, EntryPoint, ExportKind,
        LayoutContract, OutputExtent, ParamSet, Target,
    };

    // Validation
    pub use crate::validation::{ValidationPipeline, ValidationStage};

    // Execution
    pub use crate::execution::{ExecutionEngine, ExecutionOptions, ExecutionStats};

    // Kernels
    pub use crate::kernels::{Category, KernelRegistry};

    // Host and configuration
    pub use crate::config::PixkernConfig;
    pub use crate::host;
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
