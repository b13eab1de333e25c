//! Validation module for pre-invocation checking.
//!
//! The validation pipeline runs at the host boundary, before any kernel is
//! evaluated, to reject buffers and parameters that break an entry point's
//! contract.

pub mod pipeline;
pub mod stages;

pub use pipeline::ValidationPipeline;
pub use stages::{
    ArityValidation, ExtentValidation, Invocation, LayoutValidation, ParameterValidation,
    ValidationStage,
};
